//! # Rotation Composer
//!
//! Turns a host-native orientation plus position into a camera-to-world
//! transform in the destination convention.
//!
//! ```text
//!   Euler (deg) ──> radians ──> Rx, Ry, Rz ──> compose in EulerOrder ─┐
//!                                                                    ├─> adjustments ──> CameraToWorld
//!   Quaternion ────────────────> standard quaternion matrix ─────────┘
//! ```
//!
//! No validation happens here. NaN or infinite input flows through to the
//! buffer unchanged; judging the data is the reader's job.

use posecast_shared::constants::{MARKER_SLOT, SLOT_COUNT};
use posecast_shared::{CameraToWorld, EulerDegrees, Mat3, PoseRecord, Slots};

use crate::convention::{ConventionProfile, EulerOrder};
use crate::source::{Orientation, Pose};

/// Composes host poses under one fixed convention profile.
#[derive(Clone, Debug)]
pub struct RotationComposer {
    profile: ConventionProfile,
}

impl RotationComposer {
    /// Creates a composer for `profile`.
    #[must_use]
    pub fn new(profile: ConventionProfile) -> Self {
        Self { profile }
    }

    /// The active profile.
    #[inline]
    #[must_use]
    pub fn profile(&self) -> &ConventionProfile {
        &self.profile
    }

    /// Builds the adjusted camera-to-world transform for `pose`.
    #[must_use]
    pub fn compose(&self, pose: &Pose) -> CameraToWorld {
        let rotation = native_rotation(pose.orientation, self.profile.euler_order);
        let mut transform = CameraToWorld::new(rotation, pose.position);
        self.profile.adjust(&mut transform);
        transform
    }

    /// Encodes a full 17-slot record for `pose`: marker, counter,
    /// transform block, fov and both checksums.
    #[must_use]
    pub fn encode(&self, pose: &Pose, frame_counter: f64) -> Slots {
        let record = PoseRecord {
            frame_counter,
            transform: self.compose(pose),
            fov_degrees: pose.fov_degrees,
        };
        let mut slots = [0.0; SLOT_COUNT];
        slots[MARKER_SLOT] = self.profile.marker;
        record.encode_into(&mut slots, self.profile.major_order);
        slots
    }
}

/// Rotation matrix of a host orientation before any convention adjustment.
#[must_use]
pub fn native_rotation(orientation: Orientation, order: EulerOrder) -> Mat3 {
    match orientation {
        Orientation::Euler(degrees) => euler_rotation(degrees, order),
        Orientation::Quaternion(q) => Mat3::from_quaternion(q),
    }
}

/// Composes the three elementary rotations of `degrees` in `order`.
#[must_use]
pub fn euler_rotation(degrees: EulerDegrees, order: EulerOrder) -> Mat3 {
    let rx = Mat3::rotation_x(degrees.x.to_radians());
    let ry = Mat3::rotation_y(degrees.y.to_radians());
    let rz = Mat3::rotation_z(degrees.z.to_radians());
    order.compose(rx, ry, rz)
}
