//! # POSECAST Probe
//!
//! External reader process. Attaches read-only to a mapped region and
//! prints every new validated record.
//!
//! The probe never writes: it only samples, validates marker and
//! checksums, and retries torn reads.

use std::process::ExitCode;
use std::time::Duration;

use posecast::cli::{init_logging, print_usage, CliArgs};
use posecast_core::{MappedView, ReadError, RegionBacking, SnapshotReader};

fn main() -> ExitCode {
    init_logging();

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            tracing::error!("{message}");
            return ExitCode::FAILURE;
        }
    };
    if args.help {
        print_usage("posecast_probe");
        return ExitCode::SUCCESS;
    }
    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid config: {err}");
            return ExitCode::FAILURE;
        }
    };

    let RegionBacking::Mapped { path, .. } = &config.region else {
        tracing::error!("the probe needs [region] backing = \"mapped\"; anonymous regions are found with scan::locate_record");
        return ExitCode::FAILURE;
    };
    let profile = match config.profile.resolve() {
        Ok(profile) => profile,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let view = match MappedView::open(path) {
        Ok(view) => view,
        Err(err) => {
            tracing::error!(path = %path.display(), "cannot attach: {err}");
            return ExitCode::FAILURE;
        }
    };

    let reader = SnapshotReader::new(view, &profile, config.reader);
    let interval = Duration::from_millis(args.interval_ms.unwrap_or(100));
    let count = args.count.unwrap_or(u64::MAX);
    let mut last = 0.0;
    let mut printed = 0;

    tracing::info!(path = %path.display(), profile = %profile.name, "probe attached");
    while printed < count {
        match reader.read_newer(last) {
            Ok(Some(snapshot)) => {
                last = snapshot.frame_counter;
                printed += 1;
                let t = snapshot.translation();
                println!(
                    "#{:<8} pos=({:>9.3}, {:>9.3}, {:>9.3}) vfov={:.1} hfov(16:9)={:.1}",
                    snapshot.frame_counter,
                    t.x,
                    t.y,
                    t.z,
                    snapshot.fov_degrees,
                    snapshot.horizontal_fov_degrees(16.0 / 9.0),
                );
            }
            Ok(None) => {}
            Err(ReadError::NotStarted) => tracing::debug!("publisher attached, waiting for first tick"),
            Err(err @ ReadError::MarkerMismatch { .. }) => {
                tracing::error!("{err}");
                return ExitCode::FAILURE;
            }
            Err(err) => tracing::warn!("{err}"),
        }
        std::thread::sleep(interval);
    }
    ExitCode::SUCCESS
}
