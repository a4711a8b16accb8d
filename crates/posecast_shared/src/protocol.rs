//! Record layout shared between publisher and reader.
//!
//! These types are packed into the 17-slot buffer and sampled by another
//! process. Both sides must agree on the major order of the transform
//! block; it is configured per integration and never written to the buffer.

use crate::checksum;
use crate::constants::{COUNTER_SLOT, FOV_SLOT, SLOT_COUNT, TRANSFORM_SLOT, TRANSFORM_SLOTS};
use crate::math::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

/// Raw publication buffer contents.
pub type Slots = [f64; SLOT_COUNT];

/// How the 3x4 camera-to-world block is grouped in slots 2..=13.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MajorOrder {
    /// Each group is one rotation row followed by that row's translation.
    #[default]
    Row,
    /// Each group is one rotation column followed by translation component j.
    Column,
}

/// Camera-to-world transform: `world = rotation * local + translation`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraToWorld {
    /// Rotation in the destination convention
    pub rotation: Mat3,
    /// Camera position in the destination convention
    pub translation: Vec3,
}

impl CameraToWorld {
    /// Creates a transform
    #[must_use]
    pub const fn new(rotation: Mat3, translation: Vec3) -> Self {
        Self { rotation, translation }
    }

    /// Packs into the 12 transform slots.
    #[must_use]
    pub fn encode(&self, order: MajorOrder) -> [f64; TRANSFORM_SLOTS] {
        let t = self.translation.to_array();
        let mut out = [0.0; TRANSFORM_SLOTS];
        for (group, chunk) in out.chunks_exact_mut(4).enumerate() {
            let axis = match order {
                MajorOrder::Row => self.rotation.row(group),
                MajorOrder::Column => self.rotation.column(group),
            };
            chunk[..3].copy_from_slice(&axis.to_array());
            chunk[3] = t[group];
        }
        out
    }

    /// Unpacks the 12 transform slots.
    #[must_use]
    pub fn decode(block: &[f64; TRANSFORM_SLOTS], order: MajorOrder) -> Self {
        let mut rotation = Mat3::IDENTITY;
        let mut t = [0.0; 3];
        for (group, chunk) in block.chunks_exact(4).enumerate() {
            for k in 0..3 {
                match order {
                    MajorOrder::Row => rotation.m[group][k] = chunk[k],
                    MajorOrder::Column => rotation.m[k][group] = chunk[k],
                }
            }
            t[group] = chunk[3];
        }
        Self::new(rotation, Vec3::from_array(t))
    }
}

/// One logical record: everything but the marker and the trailer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseRecord {
    /// Monotonic frame counter (>= 1.0 once published)
    pub frame_counter: f64,
    /// Camera-to-world transform
    pub transform: CameraToWorld,
    /// Vertical field of view in degrees
    pub fov_degrees: f64,
}

impl PoseRecord {
    /// Writes slots 1..=16. Slot 0 (the marker) is never touched.
    pub fn encode_into(&self, slots: &mut Slots, order: MajorOrder) {
        slots[COUNTER_SLOT] = self.frame_counter;
        slots[TRANSFORM_SLOT..FOV_SLOT].copy_from_slice(&self.transform.encode(order));
        slots[FOV_SLOT] = self.fov_degrees;
        checksum::stamp(slots);
    }

    /// Reads a record back out of slots 1..=14. Does not validate.
    #[must_use]
    pub fn decode(slots: &Slots, order: MajorOrder) -> Self {
        let mut block = [0.0; TRANSFORM_SLOTS];
        block.copy_from_slice(&slots[TRANSFORM_SLOT..FOV_SLOT]);
        Self {
            frame_counter: slots[COUNTER_SLOT],
            transform: CameraToWorld::decode(&block, order),
            fov_degrees: slots[FOV_SLOT],
        }
    }
}
