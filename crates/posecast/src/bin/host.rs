//! # POSECAST Host
//!
//! Simulated host application. Activates a publisher, ticks an orbiting
//! camera into the region, and drops the camera for a while halfway
//! through so readers can watch the buffer hold its last record.
//!
//! ```bash
//! # Mapped region a probe can attach to
//! posecast_host --config posecast.toml --seconds 10
//!
//! # Then, in another shell
//! posecast_probe --config posecast.toml
//! ```

use std::process::ExitCode;
use std::time::Duration;

use posecast::cli::{init_logging, print_usage, CliArgs};
use posecast::{OrbitCamera, SharedCamera, SimulatedHost};
use posecast_core::Publisher;

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
        print_usage("posecast_host");
        return ExitCode::SUCCESS;
    }
    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid config: {err}");
            return ExitCode::FAILURE;
        }
    };

    let publisher = match Publisher::from_config(&config) {
        Ok(publisher) => publisher,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let camera = SharedCamera::new(Some(OrbitCamera::new(&config.host)));
    let host = match SimulatedHost::start(publisher, camera, &config.host) {
        Ok(host) => host,
        Err(err) => {
            tracing::error!("activation failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let total = Duration::from_secs_f64(args.seconds.unwrap_or(10.0).max(0.0));
    let quarter = total / 4;

    std::thread::sleep(quarter);
    tracing::info!("camera lost (loading screen)");
    let camera = host.camera().detach();

    std::thread::sleep(quarter);
    if let Some(camera) = camera {
        tracing::info!("camera back");
        host.camera().attach(camera);
    }

    std::thread::sleep(total.saturating_sub(quarter * 2));
    let stats = host.stop();

    println!("═══════════════════════════════════════");
    println!("  ticks:          {}", stats.ticks);
    println!("  published:      {}", stats.published);
    println!("  missing pose:   {}", stats.missing_pose);
    println!("  last counter:   {}", stats.last_frame_counter);
    println!("  achieved rate:  {:.1} Hz", stats.ticks_per_second());
    println!("═══════════════════════════════════════");
    ExitCode::SUCCESS
}
