//! Command-line arguments for the `carbon-window` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ConfigError, ScenarioConfig};
use crate::forecast::Interpolation;

/// Find the lowest-carbon start time for a fixed-length compute job.
#[derive(Debug, Parser)]
#[command(name = "carbon-window", version)]
pub struct Cli {
    /// Load the scenario from a TOML file.
    #[arg(long, value_name = "PATH", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Use a built-in preset (baseline, day_ahead, batch).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Read the forecast from a `timestamp,intensity` CSV file.
    #[arg(long, value_name = "PATH")]
    pub forecast: Option<PathBuf>,

    /// Job duration in minutes.
    #[arg(long, value_name = "MINUTES")]
    pub duration_minutes: Option<u32>,

    /// Spacing between candidate starts in minutes.
    #[arg(long, value_name = "MINUTES")]
    pub step_minutes: Option<u32>,

    /// Only search windows ending within this many hours.
    #[arg(long, value_name = "HOURS")]
    pub max_window_hours: Option<u32>,

    /// Signal model between samples.
    #[arg(long, value_name = "MODE")]
    pub interpolation: Option<Interpolation>,

    /// Write every scored candidate window to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub export_candidates: Option<PathBuf>,

    /// Print the optimization result as JSON instead of the text report.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Start the REST API after the search.
    #[cfg(feature = "api")]
    #[arg(long)]
    pub serve: bool,

    /// API server port.
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    pub port: u16,
}

impl Cli {
    /// Log filter implied by `-v` when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Resolves the scenario: `--config`, then `--preset`, then the baseline,
    /// with individual flags applied on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn scenario(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut scenario = if let Some(path) = &self.config {
            ScenarioConfig::from_toml_file(path)?
        } else if let Some(name) = &self.preset {
            ScenarioConfig::from_preset(name)?
        } else {
            ScenarioConfig::baseline()
        };

        if let Some(path) = &self.forecast {
            scenario.forecast.source = "csv".to_string();
            scenario.forecast.path = Some(path.clone());
        }
        if let Some(d) = self.duration_minutes {
            scenario.optimizer.duration_minutes = d;
        }
        if let Some(s) = self.step_minutes {
            scenario.optimizer.step_minutes = s;
        }
        if let Some(h) = self.max_window_hours {
            scenario.optimizer.max_window_hours = Some(h);
        }
        if let Some(mode) = self.interpolation {
            scenario.forecast.interpolation = mode;
        }

        Ok(scenario)
    }
}
