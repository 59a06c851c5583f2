//! Carbon-intensity forecast model and sources.

/// Validated sample series with interpolation and interval means.
pub mod series;
/// Deterministic synthetic forecast generator.
pub mod synthetic;

pub use series::{ForecastSeries, Interpolation, Sample};
pub use synthetic::SyntheticForecast;
