//! Integration test for the simulated host against an external-style reader.

use std::thread;
use std::time::{Duration, Instant};

use posecast::{OrbitCamera, SharedCamera, SimulatedHost};
use posecast_core::{
    ConventionProfile, HostConfig, MappedView, Publisher, ReadError, ReaderConfig, RegionBacking, SnapshotReader,
};

fn fast_host() -> HostConfig {
    HostConfig {
        tick_hz: 500.0,
        ..HostConfig::default()
    }
}

/// Polls until the counter passes `after` or the deadline expires.
fn wait_past<S: posecast_core::SlotSource>(reader: &SnapshotReader<S>, after: f64) -> f64 {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Ok(Some(snapshot)) = reader.read_newer(after) {
            return snapshot.frame_counter;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("counter never passed {after}");
}

#[test]
fn test_host_publishes_into_mapped_region() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("host.bin");
    let profile = ConventionProfile::gtav_row_major();
    let publisher = Publisher::new(
        profile.clone(),
        RegionBacking::Mapped {
            path: path.clone(),
            remove_on_release: true,
        },
    );

    let config = fast_host();
    let camera = SharedCamera::new(Some(OrbitCamera::new(&config)));
    let host = SimulatedHost::start(publisher, camera, &config).unwrap();

    let reader = SnapshotReader::new(MappedView::open(&path).unwrap(), &profile, ReaderConfig::default());
    let counter = wait_past(&reader, 10.0);
    assert!(counter > 10.0);

    let snapshot = reader.read().unwrap();
    let t = snapshot.translation();
    assert!(((t.x * t.x + t.y * t.y).sqrt() - config.orbit_radius).abs() < 1e-9);
    assert_eq!(snapshot.fov_degrees, config.fov_degrees);

    drop(reader);
    let stats = host.stop();
    assert!(stats.published >= 10);
    assert_eq!(stats.missing_pose, 0);
    assert!(!path.exists());
}

#[test]
fn test_detached_camera_freezes_counter() {
    let config = fast_host();
    let publisher = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
    let camera = SharedCamera::new(Some(OrbitCamera::new(&config)));
    let host = SimulatedHost::start(publisher, camera, &config).unwrap();

    let region = host.region().unwrap().clone();
    let reader = SnapshotReader::new(region, &ConventionProfile::identity(), ReaderConfig::default());
    wait_past(&reader, 3.0);

    let orbit = host.camera().detach().unwrap();
    // Let any tick that sampled before the detach land.
    thread::sleep(Duration::from_millis(20));
    let frozen = reader.read().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(reader.read().unwrap(), frozen);

    host.camera().attach(orbit);
    let resumed = wait_past(&reader, frozen.frame_counter);
    assert!(resumed > frozen.frame_counter);

    drop(reader);
    let stats = host.stop();
    assert!(stats.missing_pose > 0);
    assert_eq!(stats.published + stats.missing_pose, stats.ticks);
    assert!(stats.last_frame_counter >= resumed);
    // Missing-pose ticks never advance the counter.
    assert_eq!(stats.last_frame_counter, stats.published as f64);
}

#[test]
fn test_host_without_camera_never_starts() {
    let config = fast_host();
    let publisher = Publisher::new(ConventionProfile::identity(), RegionBacking::Anonymous);
    let host = SimulatedHost::start(publisher, SharedCamera::new(None), &config).unwrap();

    let reader = SnapshotReader::new(
        host.region().unwrap().clone(),
        &ConventionProfile::identity(),
        ReaderConfig::default(),
    );
    thread::sleep(Duration::from_millis(30));
    assert_eq!(reader.read(), Err(ReadError::NotStarted));

    drop(reader);
    let stats = host.stop();
    assert_eq!(stats.published, 0);
}
