//! # Slot Layout & Marker Constants
//!
//! The publication buffer is a contiguous array of 17 native-endian `f64`
//! slots. Every reader in the wild hard-codes these offsets.
//!
//! **CRITICAL:** Changing any value here breaks every deployed reader.
//!
//! ```text
//! [ 0] marker            write-once at activation
//! [ 1] frame counter     +1.0 per tick, >= 1.0 once published
//! [ 2..=13] 3 x (3 rotation entries + 1 translation component)
//! [14] field of view     degrees
//! [15] sum check
//! [16] alternating sum check
//! ```

// =============================================================================
// LAYOUT
// =============================================================================

/// Total number of `f64` slots in the publication buffer.
pub const SLOT_COUNT: usize = 17;

/// Size of the publication buffer in bytes.
pub const REGION_BYTES: usize = SLOT_COUNT * std::mem::size_of::<f64>();

/// Offset of the marker constant.
pub const MARKER_SLOT: usize = 0;

/// Offset of the frame counter.
pub const COUNTER_SLOT: usize = 1;

/// Offset of the first rotation/translation slot.
pub const TRANSFORM_SLOT: usize = 2;

/// Number of rotation/translation slots (3 groups of 4).
pub const TRANSFORM_SLOTS: usize = 12;

/// Offset of the field of view.
pub const FOV_SLOT: usize = 14;

/// Offset of the plain running sum.
pub const SUM_CHECK_SLOT: usize = 15;

/// Offset of the alternating running sum.
pub const ALT_SUM_CHECK_SLOT: usize = 16;

/// First payload slot covered by the checksums (the counter).
pub const PAYLOAD_START: usize = COUNTER_SLOT;

/// One past the last payload slot covered by the checksums.
pub const PAYLOAD_END: usize = SUM_CHECK_SLOT;

/// The frame counter never publishes below this value.
pub const MIN_FRAME_COUNTER: f64 = 1.0;

// =============================================================================
// MARKERS
// =============================================================================

/// Default marker written to slot 0.
///
/// Picked as an unlikely-to-occur `f64` so that a memory scan for its bytes
/// has almost no false positives.
pub const DEFAULT_MARKER: f64 = 1.380_971_895_883_128_56e-12;

/// Marker used by the Borderlands 3 scripted camera integration.
pub const BORDERLANDS3_MARKER: f64 = 1.200_405_251_314_520_21e-12;

/// Marker used by early GTA V script builds.
pub const LEGACY_MARKER: f64 = 1.234_567_890_123_45e100;

/// Returns the 8-byte pattern a memory scanner searches for.
#[must_use]
pub fn trigger_bytes(marker: f64) -> [u8; 8] {
    marker.to_ne_bytes()
}
