//! # POSECAST Shared
//!
//! Types both ends of the camera-pose buffer agree on.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `memmap2`
//! - file or process APIs
//! - anything that ties the layout to one platform
//!
//! If you need the region itself, it lives in `posecast_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod checksum;
pub mod constants;
pub mod math;
pub mod protocol;

pub use checksum::Checksums;
pub use constants::{DEFAULT_MARKER, REGION_BYTES, SLOT_COUNT};
pub use math::{Axis, EulerDegrees, Mat3, Quaternion, Vec3};
pub use protocol::{CameraToWorld, MajorOrder, PoseRecord, Slots};
