//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{LabError, Result};

/// Smallest dataset the controls allow.
pub const DATASET_SIZE_MIN: usize = 1_000;
/// Largest dataset the controls allow.
pub const DATASET_SIZE_MAX: usize = 100_000;
/// Dataset size slider step.
pub const DATASET_SIZE_STEP: usize = 1_000;
/// Largest background-update interval (ms).
pub const UPDATE_INTERVAL_MAX_MS: u64 = 5_000;
/// Background-update interval step (ms).
pub const UPDATE_INTERVAL_STEP_MS: u64 = 100;

/// Display strategy for the data table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Windowed + memoized rendering.
    Optimized,
    /// Fully materialized, unmemoized rendering.
    #[default]
    Unoptimized,
}

impl RenderMode {
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Optimized => Self::Unoptimized,
            Self::Unoptimized => Self::Optimized,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Optimized => "optimized",
            Self::Unoptimized => "unoptimized",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = LabError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "optimized" | "opt" => Ok(Self::Optimized),
            "unoptimized" | "unopt" => Ok(Self::Unoptimized),
            other => Err(LabError::InvalidConfig {
                details: format!("unknown render mode {other:?} (expected optimized|unoptimized)"),
            }),
        }
    }
}

/// Full lab configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub lab: LabConfig,
    pub metrics: MetricsConfig,
    pub view: ViewConfig,
    pub logging: LoggingConfig,
    pub paths: PathsConfig,
}

/// Initial values for the user-adjustable controls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LabConfig {
    pub mode: RenderMode,
    pub dataset_size: usize,
    pub heavy_computation: bool,
    /// Background mutation period; 0 disables.
    pub update_interval_ms: u64,
}

/// Sampling cadences for the metrics pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Length of the FPS publish window.
    pub sample_window_ms: u64,
    /// Period of the render-stats poll.
    pub render_poll_ms: u64,
    /// Target duration of one display frame.
    pub frame_interval_ms: u64,
}

/// Table presentation knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewConfig {
    /// Fixed height of one table row in terminal lines.
    pub row_height: u16,
    /// Extra rows the windowed list renders above and below the viewport.
    pub overscan: usize,
    /// Busy-wait applied to row actions in unoptimized mode.
    pub interaction_lag_ms: u64,
    /// How long a notification stays on screen.
    pub notification_ttl_ms: u64,
}

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub jsonl_path: PathBuf,
    pub max_size_bytes: u64,
    pub max_rotated_files: u32,
}

/// Filesystem paths used by rlab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Unoptimized,
            dataset_size: 10_000,
            heavy_computation: false,
            update_interval_ms: 0,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sample_window_ms: 1_000,
            render_poll_ms: 500,
            frame_interval_ms: 16,
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            row_height: 1,
            overscan: 2,
            interaction_lag_ms: 50,
            notification_ttl_ms: 3_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            jsonl_path: data_dir().join("activity.jsonl"),
            max_size_bytes: 16 * 1024 * 1024,
            max_rotated_files: 3,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: home_dir().join(".config").join("rlab").join("config.toml"),
        }
    }
}

fn home_dir() -> PathBuf {
    env::var_os("HOME").map_or_else(
        || {
            eprintln!("[RLAB-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths");
            PathBuf::from("/tmp")
        },
        PathBuf::from,
    )
}

fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("rlab")
}

impl MetricsConfig {
    #[must_use]
    pub fn sample_window(&self) -> Duration {
        Duration::from_millis(self.sample_window_ms)
    }

    #[must_use]
    pub fn render_poll(&self) -> Duration {
        Duration::from_millis(self.render_poll_ms)
    }

    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

impl ViewConfig {
    #[must_use]
    pub fn interaction_lag(&self) -> Duration {
        Duration::from_millis(self.interaction_lag_ms)
    }

    #[must_use]
    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| LabError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if is_explicit_path {
            return Err(LabError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deterministic hash of the effective config for logging.
    ///
    /// FNV-1a over canonical JSON so the value is stable across processes.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("RLAB_LAB_MODE") {
            self.lab.mode = raw.parse().map_err(|_| LabError::ConfigParse {
                context: "env",
                details: format!("RLAB_LAB_MODE={raw:?}: expected optimized|unoptimized"),
            })?;
        }
        if let Some(raw) = lookup("RLAB_LAB_DATASET_SIZE") {
            self.lab.dataset_size = parse_env("RLAB_LAB_DATASET_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_LAB_HEAVY_COMPUTATION") {
            self.lab.heavy_computation = parse_env_bool("RLAB_LAB_HEAVY_COMPUTATION", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_LAB_UPDATE_INTERVAL_MS") {
            self.lab.update_interval_ms = parse_env("RLAB_LAB_UPDATE_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_METRICS_FRAME_INTERVAL_MS") {
            self.metrics.frame_interval_ms = parse_env("RLAB_METRICS_FRAME_INTERVAL_MS", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_VIEW_INTERACTION_LAG_MS") {
            self.view.interaction_lag_ms = parse_env("RLAB_VIEW_INTERACTION_LAG_MS", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_LOGGING_ENABLED") {
            self.logging.enabled = parse_env_bool("RLAB_LOGGING_ENABLED", &raw)?;
        }
        if let Some(raw) = lookup("RLAB_LOGGING_JSONL_PATH") {
            self.logging.jsonl_path = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Check every value against the ranges the controls expose.
    pub fn validate(&self) -> Result<()> {
        validate_dataset_size(self.lab.dataset_size)?;
        validate_update_interval(self.lab.update_interval_ms)?;

        for (name, val) in [
            ("metrics.sample_window_ms", self.metrics.sample_window_ms),
            ("metrics.render_poll_ms", self.metrics.render_poll_ms),
            ("metrics.frame_interval_ms", self.metrics.frame_interval_ms),
        ] {
            if val == 0 {
                return Err(LabError::InvalidConfig {
                    details: format!("{name} must be > 0"),
                });
            }
        }

        if self.metrics.frame_interval_ms >= self.metrics.sample_window_ms {
            return Err(LabError::InvalidConfig {
                details: format!(
                    "metrics.frame_interval_ms ({}) must be < metrics.sample_window_ms ({})",
                    self.metrics.frame_interval_ms, self.metrics.sample_window_ms
                ),
            });
        }

        if self.view.row_height == 0 {
            return Err(LabError::InvalidConfig {
                details: "view.row_height must be >= 1".to_string(),
            });
        }

        if self.logging.enabled && self.logging.max_size_bytes == 0 {
            return Err(LabError::InvalidConfig {
                details: "logging.max_size_bytes must be > 0 when logging is enabled".to_string(),
            });
        }

        Ok(())
    }
}

/// Dataset size must sit on the slider: [1000, 100000] in steps of 1000.
pub fn validate_dataset_size(size: usize) -> Result<()> {
    if !(DATASET_SIZE_MIN..=DATASET_SIZE_MAX).contains(&size) || size % DATASET_SIZE_STEP != 0 {
        return Err(LabError::InvalidConfig {
            details: format!(
                "lab.dataset_size must be in [{DATASET_SIZE_MIN}, {DATASET_SIZE_MAX}] \
                 with step {DATASET_SIZE_STEP}, got {size}"
            ),
        });
    }
    Ok(())
}

/// Update interval must sit on the slider: [0, 5000] ms in steps of 100.
pub fn validate_update_interval(interval_ms: u64) -> Result<()> {
    if interval_ms > UPDATE_INTERVAL_MAX_MS || interval_ms % UPDATE_INTERVAL_STEP_MS != 0 {
        return Err(LabError::InvalidConfig {
            details: format!(
                "lab.update_interval_ms must be in [0, {UPDATE_INTERVAL_MAX_MS}] \
                 with step {UPDATE_INTERVAL_STEP_MS}, got {interval_ms}"
            ),
        });
    }
    Ok(())
}

/// Move the dataset size one slider step, clamped to the allowed range.
#[must_use]
pub fn step_dataset_size(size: usize, increase: bool) -> usize {
    let next = if increase {
        size.saturating_add(DATASET_SIZE_STEP)
    } else {
        size.saturating_sub(DATASET_SIZE_STEP)
    };
    next.clamp(DATASET_SIZE_MIN, DATASET_SIZE_MAX)
}

/// Move the update interval one slider step, clamped to the allowed range.
#[must_use]
pub fn step_update_interval(interval_ms: u64, increase: bool) -> u64 {
    let next = if increase {
        interval_ms.saturating_add(UPDATE_INTERVAL_STEP_MS)
    } else {
        interval_ms.saturating_sub(UPDATE_INTERVAL_STEP_MS)
    };
    next.min(UPDATE_INTERVAL_MAX_MS)
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse::<T>().map_err(|error| LabError::ConfigParse {
        context: "env",
        details: format!("{name}={raw:?}: {error}"),
    })
}

fn parse_env_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LabError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: expected a boolean"),
        }),
    }
}
