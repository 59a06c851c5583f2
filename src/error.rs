//! Error taxonomy for forecast evaluation and window search.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

/// Failures raised by [`ForecastSeries`](crate::forecast::ForecastSeries)
/// and [`WindowOptimizer`](crate::optimizer::WindowOptimizer).
///
/// Every variant is a local, synchronous failure. Nothing here is transient,
/// so callers should never retry without changing their inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Malformed or insufficient input samples.
    #[error("invalid forecast: {0}")]
    InvalidForecast(String),

    /// A point or interval query fell outside `[start, end]` of the series.
    #[error("{at} is outside the forecast horizon [{start}, {end}]")]
    OutOfHorizon {
        at: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Degenerate interval (`start >= end`).
    #[error("empty window: start {start} is not before end {end}")]
    EmptyWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The job does not fit inside the searchable horizon.
    #[error(
        "job duration of {} min exceeds the forecast horizon of {} min",
        duration.num_minutes(),
        horizon.num_minutes()
    )]
    DurationExceedsHorizon {
        duration: TimeDelta,
        horizon: TimeDelta,
    },

    /// Candidate step must be strictly positive.
    #[error("step size must be > 0, got {} s", step.num_seconds())]
    InvalidStep { step: TimeDelta },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ScheduleError>;
