//! # Simulated Host
//!
//! Stands in for the real application: owns a camera, calls the
//! publisher's `tick()` from its own thread at a fixed rate, and can lose
//! its camera (menu, loading screen) at any moment.
//!
//! ```text
//!   main thread                     host thread
//!   ───────────                     ───────────
//!   SimulatedHost::start ──spawn──> activate()
//!   camera().detach()               loop {
//!   camera().attach(..)               select! {
//!                                       ticker -> tick(&mut camera)
//!   stop() ───────stop_tx─────────>     stop   -> break
//!                                     }
//!                                   }
//!          <──────HostStats──────── deactivate()
//! ```

use std::f64::consts::TAU;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick, Sender};
use parking_lot::RwLock;
use posecast_core::{HostConfig, Pose, PoseSource, PublicationRegion, PublishResult, Publisher, TickOutcome};
use posecast_shared::{EulerDegrees, Vec3};
use tracing::{debug, info, warn};

/// Synthetic camera circling the origin while looking at it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitCamera {
    radius: f64,
    period_secs: f64,
    height: f64,
    fov_degrees: f64,
}

impl OrbitCamera {
    /// Camera following the path described by `config`.
    #[must_use]
    pub fn new(config: &HostConfig) -> Self {
        Self {
            radius: config.orbit_radius,
            period_secs: config.orbit_period_secs,
            height: config.camera_height,
            fov_degrees: config.fov_degrees,
        }
    }

    /// Pose `secs` seconds into the orbit.
    ///
    /// Z is up; yaw (about Z) points the camera's +X axis at the origin,
    /// pitch (about Y) tilts it down towards the orbit centre.
    #[must_use]
    pub fn pose_at(&self, secs: f64) -> Pose {
        let angle = TAU * (secs / self.period_secs).fract();
        let position = Vec3::new(self.radius * angle.cos(), self.radius * angle.sin(), self.height);
        let yaw = angle.to_degrees() + 180.0;
        let pitch = self.height.atan2(self.radius).to_degrees();
        Pose::euler(position, EulerDegrees::new(0.0, pitch, yaw), self.fov_degrees)
    }
}

/// The host's camera slot. Cloning shares the slot.
#[derive(Clone, Debug)]
pub struct SharedCamera {
    slot: Arc<RwLock<Option<OrbitCamera>>>,
    epoch: Instant,
}

impl SharedCamera {
    /// Slot holding `camera`, clock starting now.
    #[must_use]
    pub fn new(camera: Option<OrbitCamera>) -> Self {
        Self {
            slot: Arc::new(RwLock::new(camera)),
            epoch: Instant::now(),
        }
    }

    /// Puts a camera in the slot.
    pub fn attach(&self, camera: OrbitCamera) {
        *self.slot.write() = Some(camera);
    }

    /// Empties the slot. Ticks become no-ops until a camera is attached.
    pub fn detach(&self) -> Option<OrbitCamera> {
        self.slot.write().take()
    }

    /// True if a camera is in the slot.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl PoseSource for SharedCamera {
    fn sample(&mut self) -> Option<Pose> {
        let secs = self.epoch.elapsed().as_secs_f64();
        self.slot.read().as_ref().map(|camera| camera.pose_at(secs))
    }
}

/// What the host thread did over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HostStats {
    /// Tick callbacks invoked.
    pub ticks: u64,
    /// Ticks that wrote a record.
    pub published: u64,
    /// Ticks with no camera.
    pub missing_pose: u64,
    /// Last counter written.
    pub last_frame_counter: f64,
    /// Wall time between activation and release.
    pub elapsed: Duration,
}

impl HostStats {
    /// Accounts for one tick.
    pub fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Published { frame_counter } => {
                self.published += 1;
                self.last_frame_counter = frame_counter;
            }
            TickOutcome::NoPose => self.missing_pose += 1,
            TickOutcome::Inactive => {}
        }
    }

    /// Achieved tick rate.
    #[must_use]
    pub fn ticks_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.ticks as f64 / secs
        } else {
            0.0
        }
    }
}

/// Drives a [`Publisher`] from a dedicated thread.
pub struct SimulatedHost {
    camera: SharedCamera,
    region: Option<Arc<PublicationRegion>>,
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<HostStats>>,
}

impl SimulatedHost {
    /// Activates `publisher` and starts ticking it at `config.tick_hz`.
    ///
    /// # Errors
    ///
    /// Activation failures are returned before any thread is spawned.
    pub fn start(mut publisher: Publisher, camera: SharedCamera, config: &HostConfig) -> PublishResult<Self> {
        publisher.activate()?;
        let region = publisher.region();

        let interval = config.tick_interval();
        let (stop_tx, stop_rx) = bounded::<()>(1);
        let mut source = camera.clone();

        let worker = std::thread::spawn(move || {
            let ticker = tick(interval);
            let started = Instant::now();
            let mut stats = HostStats::default();

            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => stats.record(publisher.tick(&mut source)),
                }
            }

            publisher.deactivate();
            stats.elapsed = started.elapsed();
            stats
        });

        info!(tick_hz = config.tick_hz, "simulated host started");
        Ok(Self {
            camera,
            region,
            stop_tx,
            worker: Some(worker),
        })
    }

    /// The host's camera slot.
    #[must_use]
    pub fn camera(&self) -> &SharedCamera {
        &self.camera
    }

    /// In-process handle to the region. Dropped by [`stop`](Self::stop)
    /// before the publisher releases it.
    #[must_use]
    pub fn region(&self) -> Option<&Arc<PublicationRegion>> {
        self.region.as_ref()
    }

    /// Stops ticking, deactivates the publisher and returns its stats.
    #[must_use]
    pub fn stop(mut self) -> HostStats {
        self.shutdown()
    }

    fn shutdown(&mut self) -> HostStats {
        self.region = None;
        let Some(worker) = self.worker.take() else {
            return HostStats::default();
        };

        // Full or disconnected both mean the worker is already stopping.
        let _ = self.stop_tx.try_send(());
        match worker.join() {
            Ok(stats) => {
                info!(
                    ticks = stats.ticks,
                    published = stats.published,
                    missing_pose = stats.missing_pose,
                    "simulated host stopped"
                );
                stats
            }
            Err(_) => {
                warn!("host thread panicked");
                HostStats::default()
            }
        }
    }
}

impl Drop for SimulatedHost {
    fn drop(&mut self) {
        if self.worker.is_some() {
            debug!("simulated host dropped without stop()");
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for SimulatedHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedHost")
            .field("camera_attached", &self.camera.is_attached())
            .field("running", &self.worker.is_some())
            .finish_non_exhaustive()
    }
}
