//! Carbon-aware scheduling: pick the start time that minimises the mean grid
//! carbon intensity a fixed-length job is exposed to.

/// REST API over a loaded forecast.
#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod forecast;
/// CSV forecast import and candidate export.
pub mod io;
pub mod optimizer;
pub mod report;
/// End-to-end scenario execution.
pub mod runner;

pub use error::{Result, ScheduleError};
pub use forecast::{ForecastSeries, Interpolation, Sample};
pub use optimizer::{OptimizationResult, Window, WindowOptimizer, find_optimal_start};
