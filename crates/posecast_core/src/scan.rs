//! # Marker Scanner
//!
//! Readers that cannot open a mapped file (the anonymous backing) find the
//! record by scanning a dump of the host's memory for the marker bytes.
//! A candidate only counts if the whole 17-slot record behind it validates,
//! which keeps stray copies of the marker value from producing hits.

use posecast_shared::constants::{trigger_bytes, REGION_BYTES};
use posecast_shared::{MajorOrder, Slots};

use crate::error::ReadResult;
use crate::reader::{validate, Snapshot};

const STRIDE: usize = std::mem::size_of::<f64>();

/// Copies the record starting at `offset`, or `None` if it runs past the end.
#[must_use]
pub fn slots_at(bytes: &[u8], offset: usize) -> Option<Slots> {
    let end = offset.checked_add(REGION_BYTES)?;
    bytes
        .get(offset..end)
        .map(bytemuck::pod_read_unaligned::<Slots>)
}

/// Offsets (multiples of 8 from the start of `bytes`) whose first 8 bytes
/// equal the marker pattern. Checksums are not checked.
pub fn marker_candidates(bytes: &[u8], marker: f64) -> impl Iterator<Item = usize> + '_ {
    let pattern = trigger_bytes(marker);
    let limit = (bytes.len() + 1).saturating_sub(REGION_BYTES);
    (0..limit)
        .step_by(STRIDE)
        .filter(move |&offset| bytes[offset..offset + STRIDE] == pattern)
}

/// Byte offset of the first record in `bytes` that validates against
/// `marker`: marker present, counter started, both checksums consistent.
///
/// The major order does not affect validation, so none is needed here.
#[must_use]
pub fn locate_record(bytes: &[u8], marker: f64) -> Option<usize> {
    marker_candidates(bytes, marker).find(|&offset| {
        slots_at(bytes, offset)
            .is_some_and(|slots| validate(&slots, marker, MajorOrder::Row).is_ok())
    })
}

/// Validates and decodes the record at `offset`.
///
/// Returns `None` if the record would run past the end of `bytes`.
#[must_use]
pub fn snapshot_at(bytes: &[u8], offset: usize, marker: f64, order: MajorOrder) -> Option<ReadResult<Snapshot>> {
    slots_at(bytes, offset).map(|slots| validate(&slots, marker, order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::RotationComposer;
    use crate::convention::ConventionProfile;
    use crate::error::ReadError;
    use crate::source::Pose;
    use posecast_shared::constants::{DEFAULT_MARKER, SLOT_COUNT};
    use posecast_shared::{EulerDegrees, Vec3};

    fn record(counter: f64) -> Slots {
        let pose = Pose::euler(Vec3::new(4.0, 5.0, 6.0), EulerDegrees::new(10.0, 20.0, 30.0), 70.0);
        RotationComposer::new(ConventionProfile::identity()).encode(&pose, counter)
    }

    fn dump_with(record: &Slots, offset: usize, len: usize) -> Vec<u8> {
        let mut bytes = vec![0xCD_u8; len];
        bytes[offset..offset + REGION_BYTES].copy_from_slice(bytemuck::cast_slice(&record[..]));
        bytes
    }

    #[test]
    fn test_finds_record_in_noise() {
        let bytes = dump_with(&record(3.0), 512, 4096);
        assert_eq!(locate_record(&bytes, DEFAULT_MARKER), Some(512));

        let snap = snapshot_at(&bytes, 512, DEFAULT_MARKER, MajorOrder::Row).unwrap().unwrap();
        assert_eq!(snap.frame_counter, 3.0);
        assert_eq!(snap.fov_degrees, 70.0);
    }

    #[test]
    fn test_skips_bare_marker() {
        let mut bytes = dump_with(&record(9.0), 1024, 4096);
        // A lone copy of the marker value with garbage behind it
        bytes[64..72].copy_from_slice(&trigger_bytes(DEFAULT_MARKER));
        assert_eq!(marker_candidates(&bytes, DEFAULT_MARKER).collect::<Vec<_>>(), vec![64, 1024]);
        assert_eq!(locate_record(&bytes, DEFAULT_MARKER), Some(1024));
    }

    #[test]
    fn test_skips_unstarted_record() {
        let mut idle = [0.0; SLOT_COUNT];
        idle[0] = DEFAULT_MARKER;
        let bytes = dump_with(&idle, 0, 1024);
        assert_eq!(locate_record(&bytes, DEFAULT_MARKER), None);
        assert!(matches!(
            snapshot_at(&bytes, 0, DEFAULT_MARKER, MajorOrder::Row),
            Some(Err(ReadError::NotStarted))
        ));
    }

    #[test]
    fn test_record_at_very_end() {
        let bytes = dump_with(&record(1.0), 4096 - REGION_BYTES, 4096);
        assert_eq!(locate_record(&bytes, DEFAULT_MARKER), Some(4096 - REGION_BYTES));
    }

    #[test]
    fn test_short_input() {
        assert_eq!(locate_record(&[0_u8; 16], DEFAULT_MARKER), None);
        assert!(slots_at(&[0_u8; 16], 0).is_none());
        assert!(slots_at(&[0_u8; 16], usize::MAX).is_none());
    }
}
