//! Human-readable summary of a window search.

use std::fmt;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Serialize;

use crate::forecast::series::seconds;
use crate::optimizer::OptimizationResult;

/// Intensity bands used to label the grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoneThresholds {
    /// Strictly below this the grid is [`GridZone::Clean`].
    pub clean_below: f64,
    /// Strictly above this the grid is [`GridZone::Dirty`].
    pub dirty_above: f64,
}

/// Coarse label for a carbon-intensity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridZone {
    Clean,
    Moderate,
    Dirty,
}

impl GridZone {
    pub fn classify(intensity: f64, thresholds: &ZoneThresholds) -> Self {
        if intensity < thresholds.clean_below {
            Self::Clean
        } else if intensity > thresholds.dirty_above {
            Self::Dirty
        } else {
            Self::Moderate
        }
    }
}

impl fmt::Display for GridZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Moderate => f.write_str("moderate"),
            Self::Dirty => f.write_str("dirty"),
        }
    }
}

/// Emissions comparison between running now and running at the best window.
///
/// Emissions are `intensity (g/kWh) × power (kW) × duration (h)`.
#[derive(Debug, Clone)]
pub struct ScheduleReport {
    pub best_start: DateTime<Utc>,
    pub delay: TimeDelta,
    pub duration: TimeDelta,
    pub current_intensity: f64,
    pub best_intensity: f64,
    pub current_zone: GridZone,
    pub best_zone: GridZone,
    /// Estimated emissions when starting immediately (gCO2).
    pub emissions_now_g: f64,
    /// Estimated emissions at the best window (gCO2).
    pub emissions_best_g: f64,
    pub savings_fraction: f64,
}

impl ScheduleReport {
    /// Builds a report for a job drawing `power_kw` on average.
    pub fn new(result: &OptimizationResult, thresholds: &ZoneThresholds, power_kw: f64) -> Self {
        let duration = result.best.duration();
        let energy_kwh = power_kw * seconds(duration) / 3600.0;

        Self {
            best_start: result.best.start,
            delay: result.delay(),
            duration,
            current_intensity: result.current.mean_intensity,
            best_intensity: result.best.mean_intensity,
            current_zone: GridZone::classify(result.current.mean_intensity, thresholds),
            best_zone: GridZone::classify(result.best.mean_intensity, thresholds),
            emissions_now_g: result.current.mean_intensity * energy_kwh,
            emissions_best_g: result.best.mean_intensity * energy_kwh,
            savings_fraction: result.savings_fraction,
        }
    }

    /// Grams of CO2 avoided by waiting.
    pub fn saved_g(&self) -> f64 {
        self.emissions_now_g - self.emissions_best_g
    }
}

impl fmt::Display for ScheduleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Schedule Report ---")?;
        writeln!(
            f,
            "Job duration:          {}h {:02}m",
            self.duration.num_hours(),
            self.duration.num_minutes() % 60
        )?;
        writeln!(
            f,
            "Run now:               {:.1} gCO2/kWh ({})",
            self.current_intensity, self.current_zone
        )?;
        writeln!(
            f,
            "Best start:            {}",
            self.best_start.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(
            f,
            "Best window:           {:.1} gCO2/kWh ({})",
            self.best_intensity, self.best_zone
        )?;
        if self.delay > TimeDelta::zero() {
            writeln!(
                f,
                "Delay:                 {}h {:02}m",
                self.delay.num_hours(),
                self.delay.num_minutes() % 60
            )?;
        } else {
            writeln!(f, "Delay:                 start now")?;
        }
        writeln!(
            f,
            "Emissions:             {:.2} g now vs {:.2} g at best",
            self.emissions_now_g, self.emissions_best_g
        )?;
        write!(
            f,
            "Savings:               {:.2} g ({:.1}%)",
            self.saved_g(),
            self.savings_fraction * 100.0
        )
    }
}
