//! # Pinned Publication Region
//!
//! The 17-slot block an external process polls.
//!
//! ## Safety Note
//!
//! Mapping a file and viewing its bytes as atomics requires unsafe code.
//! All unsafe blocks are confined to this module and documented.

#![allow(unsafe_code)]
//!
//! ## Backings
//!
//! ```text
//!   Anonymous:  Box<[AtomicU64; 17]>  heap block, address logged at activation
//!               (readers locate it by scanning for the marker bytes)
//!
//!   Mapped:     file of 136 bytes, mmap'd shared
//!               (readers open the same path with `MappedView`)
//! ```
//!
//! Either way the block is allocated exactly once, never resized and never
//! moved until it is released.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use memmap2::{Mmap, MmapMut};
use posecast_shared::constants::{MARKER_SLOT, REGION_BYTES, SLOT_COUNT};
use posecast_shared::Slots;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PublishError, PublishResult};

type AtomicSlots = [AtomicU64; SLOT_COUNT];

/// Where the region lives.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "backing")]
pub enum RegionBacking {
    /// Heap block inside the host process.
    #[default]
    Anonymous,
    /// Shared memory-mapped file.
    Mapped {
        /// Backing file path (e.g. under `/dev/shm`).
        path: PathBuf,
        /// Delete the file on release.
        #[serde(default)]
        remove_on_release: bool,
    },
}

/// Anything a reader can sample 17 slots from.
pub trait SlotSource {
    /// Copies every slot, in slot order.
    fn load_slots(&self) -> Slots;
}

impl SlotSource for Slots {
    fn load_slots(&self) -> Slots {
        *self
    }
}

impl<T: SlotSource + ?Sized> SlotSource for &T {
    fn load_slots(&self) -> Slots {
        (**self).load_slots()
    }
}

impl<T: SlotSource + ?Sized> SlotSource for Arc<T> {
    fn load_slots(&self) -> Slots {
        (**self).load_slots()
    }
}

fn load_all(slots: &AtomicSlots) -> Slots {
    let mut out = [0.0; SLOT_COUNT];
    for (dst, src) in out.iter_mut().zip(slots) {
        *dst = f64::from_bits(src.load(Ordering::Relaxed));
    }
    out
}

enum Storage {
    Heap(Box<AtomicSlots>),
    Mapped {
        map: MmapMut,
        /// Points into `map`; valid for as long as `map` is alive.
        slots: NonNull<AtomicSlots>,
        path: PathBuf,
        remove_on_release: bool,
    },
}

/// Address-stable, fixed-size block of 17 `f64` slots.
///
/// Single writer: only the owner calls [`publish`](Self::publish).
/// Readers may sample concurrently at any time.
pub struct PublicationRegion {
    storage: Storage,
    marker: f64,
    /// Flush and removal already ran.
    closed: bool,
}

impl PublicationRegion {
    /// Allocates a heap-backed region and stamps `marker` into slot 0.
    #[must_use]
    pub fn anonymous(marker: f64) -> Self {
        let slots: Box<AtomicSlots> = Box::new(std::array::from_fn(|_| AtomicU64::new(0)));
        let region = Self {
            storage: Storage::Heap(slots),
            marker,
            closed: false,
        };
        region.stamp_marker();
        region
    }

    /// Creates (or reuses) a mapped file region and stamps `marker` into slot 0.
    ///
    /// Any stale record left in a reused file is zeroed before the marker
    /// is written.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingPath`] for an empty path and
    /// [`PublishError::Map`] if the file cannot be created, sized or mapped.
    pub fn mapped(path: impl AsRef<Path>, marker: f64, remove_on_release: bool) -> PublishResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.as_os_str().is_empty() {
            return Err(PublishError::MissingPath);
        }
        let map_err = |source| PublishError::Map {
            path: path.clone(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(map_err)?;
        file.set_len(REGION_BYTES as u64).map_err(map_err)?;

        // SAFETY: the file was just sized to REGION_BYTES and nothing here
        // truncates it. Other processes may write to it; every access goes
        // through atomics so external mutation cannot tear a slot on our side.
        let mut map = unsafe { MmapMut::map_mut(&file) }.map_err(map_err)?;

        let slots = NonNull::from(&mut map[..]).cast::<AtomicSlots>();
        debug_assert_eq!(slots.as_ptr() as usize % std::mem::align_of::<AtomicU64>(), 0);

        let region = Self {
            storage: Storage::Mapped {
                map,
                slots,
                path,
                remove_on_release,
            },
            marker,
            closed: false,
        };
        for slot in &region.slots()[MARKER_SLOT + 1..] {
            slot.store(0, Ordering::Relaxed);
        }
        region.stamp_marker();
        Ok(region)
    }

    /// Creates a region for `backing`.
    ///
    /// # Errors
    ///
    /// Propagates mapping failures from [`mapped`](Self::mapped).
    pub fn with_backing(backing: &RegionBacking, marker: f64) -> PublishResult<Self> {
        match backing {
            RegionBacking::Anonymous => Ok(Self::anonymous(marker)),
            RegionBacking::Mapped {
                path,
                remove_on_release,
            } => Self::mapped(path, marker, *remove_on_release),
        }
    }

    fn slots(&self) -> &AtomicSlots {
        match &self.storage {
            Storage::Heap(slots) => &**slots,
            // SAFETY: `slots` points at the start of `map`, which is at least
            // REGION_BYTES long, page aligned, and outlives this borrow.
            Storage::Mapped { slots, .. } => unsafe { slots.as_ref() },
        }
    }

    fn stamp_marker(&self) {
        self.slots()[MARKER_SLOT].store(self.marker.to_bits(), Ordering::Relaxed);
    }

    /// Marker stamped at creation.
    #[inline]
    #[must_use]
    pub fn marker(&self) -> f64 {
        self.marker
    }

    /// Address of slot 0 in this process.
    #[must_use]
    pub fn base_address(&self) -> usize {
        self.slots().as_ptr() as usize
    }

    /// Backing file, if mapped.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Heap(_) => None,
            Storage::Mapped { path, .. } => Some(path),
        }
    }

    /// Overwrites slots 1..=16 from `record`, in slot order.
    ///
    /// Slot 0 of `record` is ignored: the marker is write-once.
    pub fn publish(&self, record: &Slots) {
        for (slot, value) in self.slots().iter().zip(record).skip(MARKER_SLOT + 1) {
            slot.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    /// Releases the region.
    ///
    /// Mapped regions are flushed, optionally deleted, then unmapped. Both
    /// steps are attempted even if the first fails; the first failure is
    /// returned. Dropping the last handle without calling this performs the
    /// same cleanup and logs failures instead.
    ///
    /// # Errors
    ///
    /// Returns the first IO failure from flushing or removing the file.
    pub fn release(mut self) -> std::io::Result<()> {
        self.close()
    }

    fn close(&mut self) -> std::io::Result<()> {
        if std::mem::replace(&mut self.closed, true) {
            return Ok(());
        }
        match &self.storage {
            Storage::Heap(_) => Ok(()),
            Storage::Mapped {
                map,
                path,
                remove_on_release,
                ..
            } => {
                let flushed = map.flush();
                let removed = if *remove_on_release {
                    fs::remove_file(path)
                } else {
                    Ok(())
                };
                flushed.and(removed)
            }
        }
    }
}

impl Drop for PublicationRegion {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(path = ?self.path(), %error, "region cleanup on drop failed");
        }
    }
}

impl SlotSource for PublicationRegion {
    fn load_slots(&self) -> Slots {
        load_all(self.slots())
    }
}

impl std::fmt::Debug for PublicationRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicationRegion")
            .field("base_address", &format_args!("{:#x}", self.base_address()))
            .field("path", &self.path())
            .field("marker", &self.marker)
            .finish()
    }
}

// SAFETY: the only non-Send/Sync field is the NonNull into our own mapping,
// which moves with the `MmapMut` that owns it. All access is atomic.
unsafe impl Send for PublicationRegion {}
// SAFETY: shared access only performs atomic loads/stores.
unsafe impl Sync for PublicationRegion {}

/// Read-only attachment to a mapped region owned by another process.
pub struct MappedView {
    map: Mmap,
    path: PathBuf,
}

impl MappedView {
    /// Maps `path` read-only.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or mapped, or is smaller than a region.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len < REGION_BYTES as u64 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("region file is {len} bytes, expected at least {REGION_BYTES}"),
            ));
        }

        // SAFETY: the file is at least REGION_BYTES long. The writer mutates
        // it concurrently, so the bytes are only ever read through atomics.
        let map = unsafe { Mmap::map(&file) }?;
        Ok(Self { map, path })
    }

    /// Mapped file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlotSource for MappedView {
    fn load_slots(&self) -> Slots {
        // SAFETY: length checked in `open`, mmap is page aligned, and
        // word-sized atomic loads are valid on read-only mappings.
        let slots = unsafe { &*self.map.as_ptr().cast::<AtomicSlots>() };
        load_all(slots)
    }
}

impl std::fmt::Debug for MappedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedView").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posecast_shared::constants::{COUNTER_SLOT, DEFAULT_MARKER, FOV_SLOT};

    #[test]
    fn test_anonymous_region_stamps_marker() {
        let region = PublicationRegion::anonymous(DEFAULT_MARKER);
        let slots = region.load_slots();
        assert_eq!(slots[MARKER_SLOT].to_bits(), DEFAULT_MARKER.to_bits());
        assert!(slots[1..].iter().all(|v| *v == 0.0));
        assert!(region.path().is_none());
    }

    #[test]
    fn test_publish_never_touches_marker() {
        let region = PublicationRegion::anonymous(DEFAULT_MARKER);
        let mut record = [7.0; SLOT_COUNT];
        record[MARKER_SLOT] = -1.0;
        region.publish(&record);

        let slots = region.load_slots();
        assert_eq!(slots[MARKER_SLOT].to_bits(), DEFAULT_MARKER.to_bits());
        assert_eq!(slots[COUNTER_SLOT], 7.0);
        assert_eq!(slots[FOV_SLOT], 7.0);
    }

    #[test]
    fn test_address_is_stable() {
        let region = PublicationRegion::anonymous(DEFAULT_MARKER);
        let before = region.base_address();
        let moved = region;
        assert_eq!(moved.base_address(), before);
        assert!(moved.release().is_ok());
    }

    #[test]
    fn test_mapped_region_visible_through_view() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose.bin");

        let region = PublicationRegion::mapped(&path, DEFAULT_MARKER, true).unwrap();
        let view = MappedView::open(&path).unwrap();
        assert_eq!(view.load_slots()[MARKER_SLOT].to_bits(), DEFAULT_MARKER.to_bits());

        let mut record = [0.0; SLOT_COUNT];
        record[COUNTER_SLOT] = 5.0;
        region.publish(&record);
        assert_eq!(view.load_slots()[COUNTER_SLOT], 5.0);

        drop(view);
        region.release().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_mapped_region_zeroes_stale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stale.bin");
        fs::write(&path, [0xAB_u8; REGION_BYTES]).unwrap();

        let region = PublicationRegion::mapped(&path, DEFAULT_MARKER, false).unwrap();
        let slots = region.load_slots();
        assert_eq!(slots[MARKER_SLOT].to_bits(), DEFAULT_MARKER.to_bits());
        assert!(slots[1..].iter().all(|v| *v == 0.0));
        region.release().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_dropping_mapped_region_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.bin");

        let region = PublicationRegion::mapped(&path, DEFAULT_MARKER, true).unwrap();
        let mut record = [0.0; SLOT_COUNT];
        record[COUNTER_SLOT] = 3.0;
        region.publish(&record);
        assert!(path.exists());

        drop(region);
        assert!(!path.exists());
    }

    #[test]
    fn test_release_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("once.bin");

        let region = PublicationRegion::mapped(&path, DEFAULT_MARKER, true).unwrap();
        fs::remove_file(&path).unwrap();
        assert!(region.release().is_err());
    }

    #[test]
    fn test_mapped_requires_path() {
        let result = PublicationRegion::mapped("", DEFAULT_MARKER, false);
        assert!(matches!(result, Err(PublishError::MissingPath)));
    }

    #[test]
    fn test_view_rejects_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bin");
        fs::write(&path, [0_u8; 8]).unwrap();
        assert!(MappedView::open(&path).is_err());
    }

    #[test]
    fn test_backing_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            region: RegionBacking,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [region]
            backing = "mapped"
            path = "/dev/shm/posecast.bin"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.region,
            RegionBacking::Mapped {
                path: PathBuf::from("/dev/shm/posecast.bin"),
                remove_on_release: false,
            }
        );
    }
}
