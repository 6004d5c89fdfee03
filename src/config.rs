//! Configuration loading from TOML files and environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::jiggle::{JiggleConfig, JiggleInterval, Radius, PULSE_HOLD};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub jiggle: JiggleSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Startup jiggle settings. Menu changes are not written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiggleSettings {
    /// Maximum per-axis displacement in pixels (2, 5, 10 or 20).
    #[serde(default = "default_radius_px")]
    pub radius_px: u32,
    /// Seconds between pulses (1, 3, 5 or 10).
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// Begin jiggling as soon as the tray is up.
    #[serde(default)]
    pub start_active: bool,
    /// Upper bound on waiting for the timer task to stop.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
}

impl Default for JiggleSettings {
    fn default() -> Self {
        Self {
            radius_px: default_radius_px(),
            interval_seconds: default_interval_seconds(),
            start_active: false,
            stop_timeout_ms: default_stop_timeout_ms(),
        }
    }
}

impl JiggleSettings {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    /// Inactive controller state built from these settings.
    pub fn initial(&self) -> Result<JiggleConfig> {
        let radius = Radius::try_from(self.radius_px)?;
        let interval = JiggleInterval::try_from(self.interval_seconds)?;
        Ok(JiggleConfig::new(radius, interval))
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_radius_px() -> u32 {
    5
}

fn default_interval_seconds() -> u64 {
    3
}

fn default_stop_timeout_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = config_path {
            Self::from_file(path)?
        } else {
            let default_paths = [
                PathBuf::from("config/default.toml"),
                dirs::config_dir()
                    .map(|d| d.join("jiggler/config.toml"))
                    .unwrap_or_default(),
            ];

            let mut loaded = None;
            for path in &default_paths {
                if path.is_file() {
                    loaded = Some(Self::from_file(path)?);
                    break;
                }
            }
            loaded.unwrap_or_default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Apply overrides from `JIGGLER_*` variables, read through `lookup`.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("JIGGLER_RADIUS") {
            if let Ok(v) = val.parse() {
                self.jiggle.radius_px = v;
            }
        }
        if let Some(val) = lookup("JIGGLER_INTERVAL") {
            if let Ok(v) = val.parse() {
                self.jiggle.interval_seconds = v;
            }
        }
        if let Some(val) = lookup("JIGGLER_START_ACTIVE") {
            if let Ok(v) = val.parse() {
                self.jiggle.start_active = v;
            }
        }
        if let Some(val) = lookup("JIGGLER_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        Radius::try_from(self.jiggle.radius_px)?;
        JiggleInterval::try_from(self.jiggle.interval_seconds)?;
        if self.jiggle.stop_timeout() <= PULSE_HOLD {
            anyhow::bail!(
                "Stop timeout must be longer than the {}ms pulse hold",
                PULSE_HOLD.as_millis()
            );
        }
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("Log level cannot be empty");
        }
        Ok(())
    }
}
