//! # Configuration
//!
//! One TOML file, loaded once before activation. Every section has a
//! default, so an empty file is a valid configuration.
//!
//! ```toml
//! [region]
//! backing = "mapped"
//! path = "/dev/shm/posecast.bin"
//! remove_on_release = true
//!
//! [profile]
//! preset = "gtav_column_major"
//! marker = 1.20040525131452021e-12
//!
//! [reader]
//! max_retries = 64
//! retry_spin = 16
//!
//! [host]
//! tick_hz = 60.0
//! ```

use std::path::Path;

use posecast_shared::MajorOrder;
use serde::{Deserialize, Serialize};

use crate::convention::{Adjustment, ConventionProfile, EulerOrder};
use crate::error::{ConfigError, ConfigResult};
use crate::sync::RegionBacking;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PosecastConfig {
    /// Where the region lives.
    pub region: RegionBacking,
    /// Convention profile selection.
    pub profile: ProfileConfig,
    /// Snapshot reader settings.
    pub reader: ReaderConfig,
    /// Simulated host settings.
    pub host: HostConfig,
}

impl PosecastConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] / [`ConfigError::UnknownPreset`] for bad values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// as [`from_toml_str`](Self::from_toml_str).
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> ConfigResult<()> {
        if let RegionBacking::Mapped { path, .. } = &self.region {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("region.path must not be empty".into()));
            }
        }
        self.profile.resolve()?;
        self.reader.validate()?;
        self.host.validate()
    }
}

/// `[profile]`: a preset, an inline profile, or a preset with overrides.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// Preset to start from. Without one the identity profile is the base.
    pub preset: Option<String>,
    /// Overrides the profile name.
    pub name: Option<String>,
    /// Overrides the Euler composition order.
    pub euler_order: Option<EulerOrder>,
    /// Overrides the transform block grouping.
    pub major_order: Option<MajorOrder>,
    /// Replaces the adjustment list.
    pub adjustments: Option<Vec<Adjustment>>,
    /// Overrides the marker.
    pub marker: Option<f64>,
}

impl ProfileConfig {
    /// Resolves to a validated profile.
    ///
    /// # Errors
    ///
    /// Unknown preset names and unusable markers are rejected.
    pub fn resolve(&self) -> ConfigResult<ConventionProfile> {
        let mut profile = match &self.preset {
            Some(name) => ConventionProfile::preset(name)?,
            None => ConventionProfile {
                name: "custom".to_string(),
                ..ConventionProfile::identity()
            },
        };

        if let Some(name) = &self.name {
            profile.name.clone_from(name);
        }
        if let Some(order) = self.euler_order {
            profile.euler_order = order;
        }
        if let Some(order) = self.major_order {
            profile.major_order = order;
        }
        if let Some(adjustments) = &self.adjustments {
            profile.adjustments.clone_from(adjustments);
        }
        if let Some(marker) = self.marker {
            profile.marker = marker;
        }

        profile.validate()?;
        Ok(profile)
    }
}

/// `[reader]`: retry policy for the snapshot protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderConfig {
    /// Samples taken before giving up on a torn or unstamped buffer.
    pub max_retries: u32,
    /// `spin_loop` hints between samples.
    pub retry_spin: u32,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_retries: 64,
            retry_spin: 16,
        }
    }
}

impl ReaderConfig {
    /// Rejects a zero retry budget.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_retries` is 0.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("reader.max_retries must be at least 1".into()));
        }
        Ok(())
    }
}

/// `[host]`: simulated host cadence and camera path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Ticks per second.
    pub tick_hz: f64,
    /// Orbit radius in world units.
    pub orbit_radius: f64,
    /// Seconds per full orbit.
    pub orbit_period_secs: f64,
    /// Camera height above the orbit centre.
    pub camera_height: f64,
    /// Vertical field of view in degrees.
    pub fov_degrees: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_hz: 60.0,
            orbit_radius: 10.0,
            orbit_period_secs: 8.0,
            camera_height: 2.0,
            fov_degrees: 60.0,
        }
    }
}

impl HostConfig {
    /// Rejects non-positive rates and periods.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the offending field.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.tick_hz) {
            return Err(ConfigError::Invalid(format!("host.tick_hz must be > 0, got {}", self.tick_hz)));
        }
        if !positive(self.orbit_period_secs) {
            return Err(ConfigError::Invalid(format!(
                "host.orbit_period_secs must be > 0, got {}",
                self.orbit_period_secs
            )));
        }
        Ok(())
    }

    /// Interval between ticks.
    #[must_use]
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.tick_hz)
    }
}
