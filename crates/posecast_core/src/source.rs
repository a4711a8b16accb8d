//! # Pose Sources
//!
//! The host owns the camera. Once per tick the publisher asks a
//! [`PoseSource`] for a fresh [`Pose`]; `None` means there is no camera to
//! sample right now (menu, loading screen, camera destroyed) and the tick
//! becomes a no-op.

use posecast_shared::{EulerDegrees, Quaternion, Vec3};

/// Host-native orientation. Which variant a host produces is fixed per
/// integration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Orientation {
    /// Three angles in degrees, composed in the profile's `EulerOrder`.
    Euler(EulerDegrees),
    /// Unit quaternion.
    Quaternion(Quaternion),
}

impl Default for Orientation {
    fn default() -> Self {
        Self::Euler(EulerDegrees::default())
    }
}

/// One sample of the host camera. Produced fresh each tick, never retained.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Pose {
    /// Camera position in host world units.
    pub position: Vec3,
    /// Camera orientation in host convention.
    pub orientation: Orientation,
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
}

impl Pose {
    /// Pose with Euler orientation.
    #[must_use]
    pub const fn euler(position: Vec3, degrees: EulerDegrees, fov_degrees: f64) -> Self {
        Self {
            position,
            orientation: Orientation::Euler(degrees),
            fov_degrees,
        }
    }

    /// Pose with quaternion orientation.
    #[must_use]
    pub const fn quaternion(position: Vec3, rotation: Quaternion, fov_degrees: f64) -> Self {
        Self {
            position,
            orientation: Orientation::Quaternion(rotation),
            fov_degrees,
        }
    }
}

/// Supplies the host camera pose, once per tick.
pub trait PoseSource {
    /// Samples the current pose, or `None` if no camera is available.
    fn sample(&mut self) -> Option<Pose>;
}

impl<F> PoseSource for F
where
    F: FnMut() -> Option<Pose>,
{
    fn sample(&mut self) -> Option<Pose> {
        self()
    }
}
