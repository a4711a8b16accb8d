//! # Snapshot Reader
//!
//! The consumer half of the lock-free protocol. The writer never waits, so
//! the reader does all the work:
//!
//! 1. copy all 17 slots,
//! 2. slot 0 must hold the expected marker (the publisher may still be
//!    stamping a freshly sized file, so this is retried),
//! 3. a zero counter means the publisher is attached but has not ticked,
//! 4. both checksums must recompute bit for bit, otherwise the copy raced a
//!    write and is retried.
//!
//! Retries of steps 2 and 4 share one budget of `max_retries` samples.

use posecast_shared::constants::{COUNTER_SLOT, MARKER_SLOT};
use posecast_shared::{checksum, CameraToWorld, MajorOrder, Mat3, PoseRecord, Slots, Vec3};
use tracing::warn;

use crate::config::ReaderConfig;
use crate::convention::ConventionProfile;
use crate::error::{ReadError, ReadResult};
use crate::sync::SlotSource;

/// A validated record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Snapshot {
    /// Frame counter (>= 1.0).
    pub frame_counter: f64,
    /// Camera-to-world transform in the destination convention.
    pub transform: CameraToWorld,
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
}

impl Snapshot {
    /// Rotation part of the transform.
    #[inline]
    #[must_use]
    pub fn rotation(&self) -> Mat3 {
        self.transform.rotation
    }

    /// Camera position.
    #[inline]
    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.transform.translation
    }

    /// Horizontal field of view for a viewport of `aspect` = width / height.
    #[must_use]
    pub fn horizontal_fov_degrees(&self, aspect: f64) -> f64 {
        let half = self.fov_degrees.to_radians() * 0.5;
        (2.0 * (half.tan() * aspect).atan()).to_degrees()
    }
}

/// Validates one sampled copy of the buffer.
///
/// # Errors
///
/// - [`ReadError::MarkerMismatch`] if slot 0 is not `marker` (bit-exact).
/// - [`ReadError::NotStarted`] if the counter is still zero.
/// - [`ReadError::Torn`] with `attempts: 1` if the checksums disagree.
pub fn validate(slots: &Slots, marker: f64, order: MajorOrder) -> ReadResult<Snapshot> {
    let found = slots[MARKER_SLOT];
    if found.to_bits() != marker.to_bits() {
        return Err(ReadError::MarkerMismatch {
            expected: marker,
            found,
        });
    }
    if slots[COUNTER_SLOT] == 0.0 {
        return Err(ReadError::NotStarted);
    }
    if !checksum::verify(slots) {
        return Err(ReadError::Torn { attempts: 1 });
    }

    let record = PoseRecord::decode(slots, order);
    Ok(Snapshot {
        frame_counter: record.frame_counter,
        transform: record.transform,
        fov_degrees: record.fov_degrees,
    })
}

/// Samples a [`SlotSource`] until a consistent record is seen.
pub struct SnapshotReader<S> {
    source: S,
    marker: f64,
    major_order: MajorOrder,
    config: ReaderConfig,
}

impl<S: SlotSource> SnapshotReader<S> {
    /// Creates a reader expecting `profile`'s marker and major order.
    #[must_use]
    pub fn new(source: S, profile: &ConventionProfile, config: ReaderConfig) -> Self {
        Self {
            source,
            marker: profile.marker,
            major_order: profile.major_order,
            config,
        }
    }

    /// One sample, no retry.
    ///
    /// # Errors
    ///
    /// See [`validate`].
    pub fn try_read(&self) -> ReadResult<Snapshot> {
        validate(&self.source.load_slots(), self.marker, self.major_order)
    }

    /// Samples until the record validates or the retry budget runs out.
    ///
    /// Marker and checksum mismatches are retried; a not-started record
    /// returns immediately.
    ///
    /// # Errors
    ///
    /// The failure of the last sample once the budget is spent:
    /// [`ReadError::MarkerMismatch`], or [`ReadError::Torn`] carrying the
    /// number of samples taken.
    pub fn read(&self) -> ReadResult<Snapshot> {
        let attempts = self.config.max_retries.max(1);
        let mut failure = ReadError::Torn { attempts };
        for attempt in 1..=attempts {
            match self.try_read() {
                Err(ReadError::Torn { .. }) => failure = ReadError::Torn { attempts },
                Err(mismatch @ ReadError::MarkerMismatch { .. }) => failure = mismatch,
                other => return other,
            }
            if attempt < attempts {
                for _ in 0..self.config.retry_spin {
                    std::hint::spin_loop();
                }
            }
        }

        warn!(attempts, %failure, "no valid snapshot within retry budget");
        Err(failure)
    }

    /// Reads, returning `None` unless the record is newer than `last_counter`.
    ///
    /// # Errors
    ///
    /// As [`read`](Self::read).
    pub fn read_newer(&self, last_counter: f64) -> ReadResult<Option<Snapshot>> {
        let snapshot = self.read()?;
        Ok((snapshot.frame_counter > last_counter).then_some(snapshot))
    }

    /// Underlying source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Gives the source back.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S> std::fmt::Debug for SnapshotReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotReader")
            .field("marker", &self.marker)
            .field("major_order", &self.major_order)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
