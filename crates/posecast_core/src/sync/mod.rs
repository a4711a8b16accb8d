//! # Cross-Process Publication
//!
//! One writer (the host's tick callback), any number of readers in other
//! processes, and no lock between them.
//!
//! ## The Problem
//!
//! ```text
//! Host thread (writer):   overwrite slots 1..=16 every tick
//! Reader process:         sample slots 0..=16 whenever it likes
//!
//! Without coordination:   TORN READ (half old frame, half new)
//! With a mutex:           impossible, the reader lives in another process
//!                         and the host cannot be made to wait
//! ```
//!
//! ## The Solution: Optimistic Snapshot + Validate
//!
//! ```text
//! Writer:  counter, transform, fov, sum, alt_sum   (plain overwrite)
//! Reader:  copy all 17 slots
//!          marker ok?  checksums recompute?  ──yes──> accept
//!                     │
//!                     └──no──> retry (bounded)
//! ```
//!
//! Each slot is stored as a relaxed `AtomicU64` so a single slot never
//! tears; whole-record consistency rests on the checksums alone.

mod region;

pub use region::{MappedView, PublicationRegion, RegionBacking, SlotSource};
