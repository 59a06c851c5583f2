//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use carbon_window::forecast::{ForecastSeries, Interpolation, Sample};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// First sample instant used across fixtures (2024-05-01 00:00 UTC).
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

/// Hourly intensities used by the reference scenario.
pub const SCENARIO: [f64; 7] = [250.0, 250.0, 200.0, 150.0, 90.0, 90.0, 120.0];

/// Builds an hourly series starting at [`t0`].
pub fn hourly(values: &[f64], interpolation: Interpolation) -> ForecastSeries {
    let samples = values
        .iter()
        .enumerate()
        .map(|(h, &v)| Sample::new(t0() + TimeDelta::hours(h as i64), v))
        .collect();
    ForecastSeries::with_interpolation(samples, interpolation).unwrap()
}

/// The reference scenario with the given interpolation.
pub fn scenario_series(interpolation: Interpolation) -> ForecastSeries {
    hourly(&SCENARIO, interpolation)
}

/// Hours from [`t0`] to `t`.
pub fn hours_from_t0(t: DateTime<Utc>) -> i64 {
    (t - t0()).num_hours()
}

/// Asserts two floats agree to within `1e-9`.
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
