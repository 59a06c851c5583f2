//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use serde::Deserialize;
use thiserror::Error;

use crate::forecast::Interpolation;
use crate::optimizer::{DEFAULT_STEP_MINUTES, DEFAULT_TIE_EPSILON, WindowOptimizer};
use crate::report::ZoneThresholds;

/// Longest search window a scenario may request, in hours.
pub const MAX_WINDOW_HOURS: u32 = 47;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Job and search parameters.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Where the forecast comes from and how it is interpolated.
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Presentation parameters for the schedule report.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Job and search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Job duration in minutes (must be > 0).
    pub duration_minutes: u32,
    /// Spacing between candidate starts in minutes (must be > 0).
    pub step_minutes: u32,
    /// Only search windows ending within this many hours of the first sample.
    pub max_window_hours: Option<u32>,
    /// Mean intensities closer than this are ties (earliest wins).
    pub tie_epsilon: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 60,
            step_minutes: DEFAULT_STEP_MINUTES as u32,
            max_window_hours: None,
            tie_epsilon: DEFAULT_TIE_EPSILON,
        }
    }
}

impl OptimizerConfig {
    pub fn duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration_minutes))
    }

    /// Builds the optimizer described by this section.
    pub fn optimizer(&self) -> WindowOptimizer {
        let optimizer = WindowOptimizer::new(TimeDelta::minutes(i64::from(self.step_minutes)))
            .with_tie_epsilon(self.tie_epsilon);
        match self.max_window_hours {
            Some(h) => optimizer.with_max_window(TimeDelta::hours(i64::from(h))),
            None => optimizer,
        }
    }
}

/// Forecast source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// `"synthetic"` or `"csv"`.
    pub source: String,
    /// CSV file, required when `source = "csv"`.
    pub path: Option<PathBuf>,
    /// `"linear"` (trapezoidal) or `"hold"` (step).
    pub interpolation: Interpolation,
    /// Synthetic sample spacing (minutes).
    pub interval_minutes: u32,
    /// Synthetic sample count.
    pub points: usize,
    /// Synthetic Gaussian jitter (gCO2/kWh).
    pub noise_std: f64,
    /// Synthetic jitter seed.
    pub seed: u64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: "synthetic".to_string(),
            path: None,
            interpolation: Interpolation::Linear,
            interval_minutes: 30,
            points: 96,
            noise_std: 0.0,
            seed: 42,
        }
    }
}

/// Schedule report parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Below this intensity the grid is labelled clean (gCO2/kWh).
    pub clean_below: f64,
    /// Above this intensity the grid is labelled dirty (gCO2/kWh).
    pub dirty_above: f64,
    /// Average power draw of the job (kW), used for emissions estimates.
    pub power_kw: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            clean_below: 120.0,
            dirty_above: 180.0,
            power_kw: 0.3,
        }
    }
}

impl ReportConfig {
    pub fn thresholds(&self) -> ZoneThresholds {
        ZoneThresholds {
            clean_below: self.clean_below,
            dirty_above: self.dirty_above,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"optimizer.step_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: one-hour job, whole synthetic forecast.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the day-ahead preset: search limited to the next 24 hours.
    pub fn day_ahead() -> Self {
        Self {
            optimizer: OptimizerConfig {
                max_window_hours: Some(24),
                ..OptimizerConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the batch preset: four-hour job, finer search grid, noisy
    /// forecast over the full 47-hour window.
    pub fn batch() -> Self {
        Self {
            optimizer: OptimizerConfig {
                duration_minutes: 240,
                step_minutes: 15,
                max_window_hours: Some(47),
                ..OptimizerConfig::default()
            },
            forecast: ForecastConfig {
                noise_std: 8.0,
                seed: 7,
                ..ForecastConfig::default()
            },
            report: ReportConfig {
                power_kw: 1.2,
                ..ReportConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "day_ahead", "batch"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "day_ahead" => Ok(Self::day_ahead()),
            "batch" => Ok(Self::batch()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let o = &self.optimizer;
        if o.duration_minutes == 0 {
            errors.push(ConfigError::new("optimizer.duration_minutes", "must be > 0"));
        }
        if o.step_minutes == 0 {
            errors.push(ConfigError::new("optimizer.step_minutes", "must be > 0"));
        }
        match o.max_window_hours {
            Some(0) => errors.push(ConfigError::new("optimizer.max_window_hours", "must be > 0")),
            Some(h) if h > MAX_WINDOW_HOURS => errors.push(ConfigError::new(
                "optimizer.max_window_hours",
                format!("must be <= {MAX_WINDOW_HOURS}, got {h}"),
            )),
            Some(h) if u64::from(o.duration_minutes) > u64::from(h) * 60 => {
                errors.push(ConfigError::new(
                    "optimizer.duration_minutes",
                    format!("must fit inside optimizer.max_window_hours ({h} h)"),
                ));
            }
            _ => {}
        }
        if !o.tie_epsilon.is_finite() || o.tie_epsilon < 0.0 {
            errors.push(ConfigError::new(
                "optimizer.tie_epsilon",
                "must be finite and >= 0",
            ));
        }

        let f = &self.forecast;
        match f.source.as_str() {
            "synthetic" => {}
            "csv" => {
                if f.path.is_none() {
                    errors.push(ConfigError::new(
                        "forecast.path",
                        "required when forecast.source = \"csv\"",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "forecast.source",
                format!("must be \"synthetic\" or \"csv\", got \"{other}\""),
            )),
        }
        if f.interval_minutes == 0 {
            errors.push(ConfigError::new("forecast.interval_minutes", "must be > 0"));
        }
        if f.points < 2 {
            errors.push(ConfigError::new("forecast.points", "must be >= 2"));
        }
        if !f.noise_std.is_finite() || f.noise_std < 0.0 {
            errors.push(ConfigError::new(
                "forecast.noise_std",
                "must be finite and >= 0",
            ));
        }

        let r = &self.report;
        if r.clean_below >= r.dirty_above {
            errors.push(ConfigError::new(
                "report.clean_below",
                "must be < report.dirty_above",
            ));
        }
        if !r.power_kw.is_finite() || r.power_kw < 0.0 {
            errors.push(ConfigError::new("report.power_kw", "must be finite and >= 0"));
        }

        errors
    }
}
