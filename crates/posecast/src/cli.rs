//! Argument handling for the binaries.
//!
//! Flags are `--name value` pairs plus `--help`/`-h`; anything else is
//! rejected so typos do not silently fall back to defaults.

use std::path::PathBuf;

use posecast_core::{ConfigResult, PosecastConfig};

/// Parsed command line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CliArgs {
    /// `--config <path>`
    pub config: Option<PathBuf>,
    /// `--seconds <n>`: how long to run.
    pub seconds: Option<f64>,
    /// `--count <n>`: how many samples the probe prints.
    pub count: Option<u64>,
    /// `--interval-ms <n>`: probe polling interval.
    pub interval_ms: Option<u64>,
    /// `--help` / `-h`: print usage and exit.
    pub help: bool,
}

impl CliArgs {
    /// Parses `args` (without the program name).
    ///
    /// # Errors
    ///
    /// Returns a message naming the first unknown flag, missing value or
    /// unparsable number.
    pub fn parse<I>(args: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(flag) = args.next() {
            if matches!(flag.as_str(), "--help" | "-h") {
                parsed.help = true;
                continue;
            }
            let value = args.next().ok_or_else(|| format!("{flag} needs a value"))?;
            let number = |v: &str| v.parse::<u64>().map_err(|e| format!("{flag} {v}: {e}"));
            match flag.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value)),
                "--seconds" => {
                    parsed.seconds = Some(value.parse().map_err(|e| format!("{flag} {value}: {e}"))?);
                }
                "--count" => parsed.count = Some(number(&value)?),
                "--interval-ms" => parsed.interval_ms = Some(number(&value)?),
                other => return Err(format!("unknown flag {other}")),
            }
        }
        Ok(parsed)
    }

    /// Loads the config file, or the defaults if none was given.
    ///
    /// # Errors
    ///
    /// Propagates read, parse and validation failures.
    pub fn load_config(&self) -> ConfigResult<PosecastConfig> {
        match &self.config {
            Some(path) => PosecastConfig::from_file(path),
            None => Ok(PosecastConfig::default()),
        }
    }
}

/// Prints the shared option list for `program`.
pub fn print_usage(program: &str) {
    println!("Usage: {program} [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <PATH>        TOML config (default: built-in defaults)");
    println!("  --seconds <SECS>       Host run time (default: 10)");
    println!("  --count <NUM>          Records the probe prints (default: unlimited)");
    println!("  --interval-ms <MS>     Probe polling interval (default: 100)");
    println!("  -h, --help             Show this help");
}

/// Installs the `fmt` subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
