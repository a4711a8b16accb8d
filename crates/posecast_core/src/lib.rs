//! # POSECAST Core Engine
//!
//! Publishes a live camera pose from a host application into a fixed
//! 17-slot `f64` block that another process polls without any lock.
//!
//! ## Architecture Rules
//!
//! 1. **Total tick** - nothing in the per-tick path returns an error or
//!    allocates; missing poses are a no-op
//! 2. **Write-once marker** - slot 0 is stamped at activation and never
//!    rewritten
//! 3. **Readers validate** - the writer never waits; readers check marker
//!    and checksums and retry
//!
//! ## Example
//!
//! ```rust,ignore
//! use posecast_core::{ConventionProfile, Publisher, RegionBacking};
//!
//! let mut publisher = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
//! publisher.activate()?;
//! publisher.tick(&mut || camera.current_pose());
//! publisher.deactivate();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod composer;
pub mod config;
pub mod convention;
pub mod error;
pub mod publisher;
pub mod reader;
pub mod scan;
pub mod source;
pub mod sync;

pub use composer::RotationComposer;
pub use config::{HostConfig, PosecastConfig, ProfileConfig, ReaderConfig};
pub use convention::{Adjustment, ConventionProfile, EulerOrder, PRESET_NAMES};
pub use error::{ConfigError, ConfigResult, PublishError, PublishResult, ReadError, ReadResult};
pub use publisher::{LifecycleState, Publisher, TickOutcome};
pub use reader::{Snapshot, SnapshotReader};
pub use source::{Orientation, Pose, PoseSource};
pub use sync::{MappedView, PublicationRegion, RegionBacking, SlotSource};
