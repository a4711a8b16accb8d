//! # Publisher Lifecycle
//!
//! The explicit context object the host plugin owns. No globals: the
//! region handle, frame counter and profile all live here and are threaded
//! through the three lifecycle hooks.
//!
//! ```text
//!   Uninitialized ──activate()──> Active ──deactivate()──> Released
//!         │                         │ tick() x N                ▲
//!         └──────────deactivate()───┼───────────────────────────┘
//!                                   │
//!                        sample ─> compose ─> encode ─> checksum ─> publish
//! ```
//!
//! `tick()` and `deactivate()` are total: they never return an error and
//! never panic on bad pose data. Only `activate()` can fail, and only
//! because the region could not be created.

use std::sync::Arc;

use posecast_shared::constants::MIN_FRAME_COUNTER;
use tracing::{debug, info, trace, warn};

use crate::composer::RotationComposer;
use crate::config::PosecastConfig;
use crate::convention::ConventionProfile;
use crate::error::{PublishError, PublishResult};
use crate::source::{Pose, PoseSource};
use crate::sync::{PublicationRegion, RegionBacking};

/// Lifecycle state of a [`Publisher`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, no region yet.
    Uninitialized,
    /// Region allocated and marker stamped; ticks publish.
    Active,
    /// Region released. Terminal.
    Released,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// A fresh record was written.
    Published {
        /// Counter value written to slot 1.
        frame_counter: f64,
    },
    /// The pose source had nothing; previous contents persist.
    NoPose,
    /// The publisher is not active; nothing was touched.
    Inactive,
}

impl TickOutcome {
    /// True if a record was written.
    #[inline]
    #[must_use]
    pub fn is_published(self) -> bool {
        matches!(self, Self::Published { .. })
    }
}

enum State {
    Uninitialized,
    Active {
        region: Arc<PublicationRegion>,
        counter: f64,
    },
    Released,
}

/// Owns the publication region for the plugin's active lifetime.
pub struct Publisher {
    composer: RotationComposer,
    backing: RegionBacking,
    state: State,
    /// Last tick found no pose; used to log the transition once.
    pose_missing: bool,
}

impl Publisher {
    /// Creates an uninitialized publisher.
    #[must_use]
    pub fn new(profile: ConventionProfile, backing: RegionBacking) -> Self {
        Self {
            composer: RotationComposer::new(profile),
            backing,
            state: State::Uninitialized,
            pose_missing: false,
        }
    }

    /// Creates an uninitialized publisher from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Config`] if the profile section does not
    /// resolve to a usable profile.
    pub fn from_config(config: &PosecastConfig) -> PublishResult<Self> {
        let profile = config.profile.resolve()?;
        Ok(Self::new(profile, config.region.clone()))
    }

    /// Allocates the region and stamps the marker.
    ///
    /// # Errors
    ///
    /// - [`PublishError::AlreadyActive`] if called twice.
    /// - [`PublishError::Released`] after [`deactivate`](Self::deactivate).
    /// - Region creation failures.
    pub fn activate(&mut self) -> PublishResult<()> {
        match self.state {
            State::Active { .. } => return Err(PublishError::AlreadyActive),
            State::Released => return Err(PublishError::Released),
            State::Uninitialized => {}
        }

        let profile = self.composer.profile();
        profile.validate()?;
        let region = PublicationRegion::with_backing(&self.backing, profile.marker)?;

        info!(
            profile = %profile.name,
            address = format_args!("{:#x}", region.base_address()),
            path = ?region.path(),
            marker_bits = format_args!("{:#018x}", profile.marker.to_bits()),
            "publication region active"
        );

        self.state = State::Active {
            region: Arc::new(region),
            counter: 0.0,
        };
        Ok(())
    }

    /// Runs the pipeline once: sample, compose, encode, checksum, publish.
    ///
    /// Never fails. Without a pose the buffer keeps its previous record.
    pub fn tick<S: PoseSource + ?Sized>(&mut self, source: &mut S) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Inactive;
        }

        match source.sample() {
            Some(pose) => {
                if self.pose_missing {
                    debug!("pose source available again");
                    self.pose_missing = false;
                }
                self.publish(&pose)
            }
            None => {
                if !self.pose_missing {
                    debug!("no pose available, holding last record");
                    self.pose_missing = true;
                }
                TickOutcome::NoPose
            }
        }
    }

    /// Publishes an already-sampled pose.
    pub fn publish(&mut self, pose: &Pose) -> TickOutcome {
        let State::Active { region, counter } = &mut self.state else {
            return TickOutcome::Inactive;
        };

        let next = (*counter + 1.0).max(MIN_FRAME_COUNTER);
        let slots = self.composer.encode(pose, next);
        region.publish(&slots);
        *counter = next;

        trace!(frame_counter = next, "published");
        TickOutcome::Published { frame_counter: next }
    }

    /// Releases the region. Terminal; safe to call in any state.
    ///
    /// Release failures are logged and swallowed.
    pub fn deactivate(&mut self) {
        let previous = std::mem::replace(&mut self.state, State::Released);
        let State::Active { region, counter } = previous else {
            return;
        };

        match Arc::try_unwrap(region) {
            Ok(region) => {
                let path = region.path().map(std::path::Path::to_path_buf);
                if let Err(error) = region.release() {
                    warn!(?path, %error, "region release failed, continuing shutdown");
                }
            }
            Err(shared) => {
                warn!(
                    handles = Arc::strong_count(&shared) - 1,
                    "region still attached by readers, cleaned up when the last one detaches"
                );
            }
        }

        info!(frames = counter, "publication region released");
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match self.state {
            State::Uninitialized => LifecycleState::Uninitialized,
            State::Active { .. } => LifecycleState::Active,
            State::Released => LifecycleState::Released,
        }
    }

    /// True between `activate()` and `deactivate()`.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// Last counter written, or 0.0 if nothing has been published.
    #[must_use]
    pub fn frame_counter(&self) -> f64 {
        match &self.state {
            State::Active { counter, .. } => *counter,
            _ => 0.0,
        }
    }

    /// Shared handle to the live region, for in-process readers.
    #[must_use]
    pub fn region(&self) -> Option<Arc<PublicationRegion>> {
        match &self.state {
            State::Active { region, .. } => Some(Arc::clone(region)),
            _ => None,
        }
    }

    /// Active convention profile.
    #[must_use]
    pub fn profile(&self) -> &ConventionProfile {
        self.composer.profile()
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.deactivate();
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("profile", &self.profile().name)
            .field("backing", &self.backing)
            .field("state", &self.state())
            .field("frame_counter", &self.frame_counter())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SlotSource;
    use posecast_shared::constants::{COUNTER_SLOT, DEFAULT_MARKER, MARKER_SLOT};
    use posecast_shared::{EulerDegrees, Vec3};

    fn pose() -> Pose {
        Pose::euler(Vec3::new(1.0, 2.0, 3.0), EulerDegrees::default(), 60.0)
    }

    fn active() -> Publisher {
        let mut publisher = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
        publisher.activate().unwrap();
        publisher
    }

    #[test]
    fn test_tick_before_activate_is_noop() {
        let mut publisher = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
        let mut source = || Some(pose());
        assert_eq!(publisher.tick(&mut source), TickOutcome::Inactive);
        assert_eq!(publisher.state(), LifecycleState::Uninitialized);
        assert!(publisher.region().is_none());
    }

    #[test]
    fn test_activate_twice_errors() {
        let mut publisher = active();
        assert!(matches!(publisher.activate(), Err(PublishError::AlreadyActive)));
        assert!(publisher.is_active());
    }

    #[test]
    fn test_reactivate_after_release_errors() {
        let mut publisher = active();
        publisher.deactivate();
        assert!(matches!(publisher.activate(), Err(PublishError::Released)));
        assert_eq!(publisher.state(), LifecycleState::Released);
    }

    #[test]
    fn test_first_tick_counter_is_one() {
        let mut publisher = active();
        let mut source = || Some(pose());
        assert_eq!(
            publisher.tick(&mut source),
            TickOutcome::Published { frame_counter: 1.0 }
        );
        let slots = publisher.region().unwrap().load_slots();
        assert_eq!(slots[COUNTER_SLOT], 1.0);
        assert_eq!(slots[MARKER_SLOT].to_bits(), DEFAULT_MARKER.to_bits());
    }

    #[test]
    fn test_missing_pose_keeps_previous_record() {
        let mut publisher = active();
        publisher.publish(&pose());
        let before = publisher.region().unwrap().load_slots();

        let mut nothing = || -> Option<Pose> { None };
        assert_eq!(publisher.tick(&mut nothing), TickOutcome::NoPose);
        assert_eq!(publisher.tick(&mut nothing), TickOutcome::NoPose);

        let after = publisher.region().unwrap().load_slots();
        assert_eq!(before, after);
        assert_eq!(publisher.frame_counter(), 1.0);
    }

    #[test]
    fn test_deactivate_any_state_never_panics() {
        let mut fresh = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
        fresh.deactivate();
        fresh.deactivate();
        assert_eq!(fresh.state(), LifecycleState::Released);

        let mut live = active();
        live.deactivate();
        live.deactivate();
        let mut source = || Some(pose());
        assert_eq!(live.tick(&mut source), TickOutcome::Inactive);
    }

    #[test]
    fn test_deactivate_with_attached_reader() {
        let mut publisher = active();
        publisher.publish(&pose());
        let region = publisher.region().unwrap();
        publisher.deactivate();

        // The reader's handle keeps the block alive and unchanged.
        assert_eq!(region.load_slots()[COUNTER_SLOT], 1.0);
    }

    #[test]
    fn test_invalid_marker_refuses_activation() {
        let profile = ConventionProfile {
            marker: f64::NAN,
            ..ConventionProfile::identity()
        };
        let mut publisher = Publisher::new(profile, RegionBacking::Anonymous);
        assert!(matches!(publisher.activate(), Err(PublishError::Config(_))));
        assert_eq!(publisher.state(), LifecycleState::Uninitialized);
    }
}
