//! # Integrity Checksum
//!
//! Two running sums over the payload slots (counter through fov) let a
//! lock-free reader detect a torn snapshot:
//!
//! - `sum`: plain running sum of the 14 payload values.
//! - `alt_sum`: starts at the counter, then subtracts values at even slot
//!   offsets and adds values at odd slot offsets.
//!
//! The alternating sum catches value swaps between neighbouring slots that
//! leave the plain sum unchanged.
//!
//! Summation order is part of the contract: readers must recompute in slot
//! order to reproduce the writer's rounding bit for bit.

use crate::constants::{ALT_SUM_CHECK_SLOT, COUNTER_SLOT, PAYLOAD_END, SLOT_COUNT, SUM_CHECK_SLOT};

/// The two trailer values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checksums {
    /// Plain running sum (slot 15).
    pub sum: f64,
    /// Alternating running sum (slot 16).
    pub alt_sum: f64,
}

impl Checksums {
    /// Computes both checks over slots 1..=14 of `slots`.
    #[must_use]
    pub fn compute(slots: &[f64; SLOT_COUNT]) -> Self {
        let counter = slots[COUNTER_SLOT];
        let mut sum = counter;
        let mut alt_sum = counter;

        for (offset, &value) in slots.iter().enumerate().take(PAYLOAD_END).skip(COUNTER_SLOT + 1) {
            sum += value;
            if offset % 2 == 1 {
                alt_sum += value;
            } else {
                alt_sum -= value;
            }
        }

        Self { sum, alt_sum }
    }

    /// Reads the stored trailer of `slots`.
    #[must_use]
    pub fn stored(slots: &[f64; SLOT_COUNT]) -> Self {
        Self {
            sum: slots[SUM_CHECK_SLOT],
            alt_sum: slots[ALT_SUM_CHECK_SLOT],
        }
    }

    /// Writes the trailer into slots 15 and 16.
    pub fn store(self, slots: &mut [f64; SLOT_COUNT]) {
        slots[SUM_CHECK_SLOT] = self.sum;
        slots[ALT_SUM_CHECK_SLOT] = self.alt_sum;
    }

    /// Bit-exact comparison.
    ///
    /// NaN payloads produce NaN checks; comparing bits lets such a record
    /// validate so the consumer sees exactly what the host supplied.
    #[must_use]
    pub fn matches(self, other: Self) -> bool {
        self.sum.to_bits() == other.sum.to_bits() && self.alt_sum.to_bits() == other.alt_sum.to_bits()
    }
}

/// Computes and stores the trailer for an already-written payload.
pub fn stamp(slots: &mut [f64; SLOT_COUNT]) -> Checksums {
    let checks = Checksums::compute(slots);
    checks.store(slots);
    checks
}

/// Returns true when the stored trailer matches the payload.
#[must_use]
pub fn verify(slots: &[f64; SLOT_COUNT]) -> bool {
    Checksums::compute(slots).matches(Checksums::stored(slots))
}
