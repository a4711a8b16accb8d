//! # POSECAST
//!
//! Host-side integration: a simulated host that drives the publisher from
//! its own tick thread, plus the pieces the two binaries share.
//!
//! ```text
//!   ┌──────────────────────────┐            ┌──────────────────────────┐
//!   │ posecast_host            │            │ posecast_probe           │
//!   │                          │   17 x f64 │                          │
//!   │  OrbitCamera ─> tick() ──┼──> region ─┼──> SnapshotReader        │
//!   │                          │  (mmap'd)  │    marker + checksums    │
//!   └──────────────────────────┘            └──────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `host`: simulated host, orbit camera, tick stats
//! - `cli`: argument handling shared by the binaries

pub mod cli;
pub mod host;

/// Re-export the core engine.
pub use posecast_core as core;

/// Re-export shared types.
pub use posecast_shared as shared;

pub use host::{HostStats, OrbitCamera, SharedCamera, SimulatedHost};
