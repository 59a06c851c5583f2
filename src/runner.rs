//! Scenario execution: load the forecast, search, and summarise.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{ForecastConfig, ScenarioConfig};
use crate::error::ScheduleError;
use crate::forecast::{ForecastSeries, SyntheticForecast};
use crate::io::import::{ImportError, read_forecast_from_path};
use crate::optimizer::{OptimizationResult, Window};
use crate::report::ScheduleReport;

/// Failure while running a scenario end to end.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("forecast.path is required when forecast.source = \"csv\"")]
    MissingCsvPath,

    #[error("unknown forecast source \"{0}\", expected \"synthetic\" or \"csv\"")]
    UnknownSource(String),
}

/// Everything a caller may want to render after one search.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub result: OptimizationResult,
    /// Every scored candidate, in start order.
    pub candidates: Vec<Window>,
    pub report: ScheduleReport,
}

/// Builds the forecast described by `cfg`, cut so it starts at `now`.
///
/// Synthetic forecasts are generated from the half hour at or before `now`.
/// Any forecast whose horizon contains `now` is sliced to `[now, end]`, so
/// the "run now" baseline never lies in the past.
///
/// # Errors
///
/// Returns [`RunError::MissingCsvPath`] or [`RunError::UnknownSource`] for an
/// unusable source, [`RunError::Import`] if the CSV cannot be read, and
/// [`RunError::Schedule`] if the samples are invalid.
pub fn load_forecast(cfg: &ForecastConfig, now: DateTime<Utc>) -> Result<ForecastSeries, RunError> {
    let series = match cfg.source.as_str() {
        "csv" => {
            let path = cfg.path.as_ref().ok_or(RunError::MissingCsvPath)?;
            read_forecast_from_path(path, cfg.interpolation)?
        }
        "synthetic" => {
            let mut generator = SyntheticForecast::from_now(now);
            generator.interval = TimeDelta::minutes(i64::from(cfg.interval_minutes));
            generator.points = cfg.points;
            generator.noise_std = cfg.noise_std;
            generator.seed = cfg.seed;
            generator.build(cfg.interpolation)?
        }
        other => return Err(RunError::UnknownSource(other.to_string())),
    };

    let series = if series.start() < now && now < series.end() {
        debug!(from = %series.start(), to = %now, "dropping elapsed forecast samples");
        series.slice(now, series.end())?
    } else {
        series
    };

    info!(
        source = %cfg.source,
        samples = series.len(),
        start = %series.start(),
        end = %series.end(),
        interpolation = %series.interpolation(),
        "forecast loaded"
    );
    Ok(series)
}

/// Runs the configured search over `series`.
///
/// # Errors
///
/// Propagates any [`ScheduleError`] from the optimizer.
pub fn run_scenario(cfg: &ScenarioConfig, series: &ForecastSeries) -> Result<RunOutput, RunError> {
    let optimizer = cfg.optimizer.optimizer();
    let duration = cfg.optimizer.duration();

    let (result, candidates) = optimizer.search(series, duration)?;
    let report = ScheduleReport::new(&result, &cfg.report.thresholds(), cfg.report.power_kw);

    info!(
        best_start = %result.best.start,
        best_mean = result.best.mean_intensity,
        savings_pct = result.savings_fraction * 100.0,
        "optimal window selected"
    );

    Ok(RunOutput {
        result,
        candidates,
        report,
    })
}
