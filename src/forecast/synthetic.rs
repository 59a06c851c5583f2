//! Synthetic day-ahead forecast for demos and offline runs.
//!
//! Produces a plausible grid profile without a live data provider: clean
//! overnight hours, a morning ramp, a moderate day, an evening peak, and a
//! late-evening decline. A fixed seven-step ripple keeps the output
//! deterministic; optional seeded Gaussian jitter adds weather-like noise.

use chrono::{DateTime, TimeDelta, Timelike, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::series::{ForecastSeries, Interpolation, Sample};
use crate::error::{Result, ScheduleError};

/// Upper bound on the up-front sample allocation.
const MAX_PREALLOCATED: usize = 4096;

/// Generator settings for a synthetic forecast.
#[derive(Debug, Clone)]
pub struct SyntheticForecast {
    /// Timestamp of the first sample.
    pub start: DateTime<Utc>,
    /// Spacing between samples.
    pub interval: TimeDelta,
    /// Number of samples to generate.
    pub points: usize,
    /// Standard deviation of added Gaussian noise (gCO2/kWh). Zero disables it.
    pub noise_std: f64,
    /// Seed for the noise generator.
    pub seed: u64,
}

impl SyntheticForecast {
    /// 48 hours of half-hourly samples starting at `start`, without noise.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            interval: TimeDelta::minutes(30),
            points: 96,
            noise_std: 0.0,
            seed: 42,
        }
    }

    /// Same as [`SyntheticForecast::new`] but starting at the most recent
    /// full or half hour at or before `now`.
    pub fn from_now(now: DateTime<Utc>) -> Self {
        Self::new(align_to_half_hour(now))
    }

    /// Generates the raw samples.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidForecast`] if a sample timestamp would
    /// overflow the supported date range.
    pub fn samples(&self) -> Result<Vec<Sample>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(self.points.min(MAX_PREALLOCATED));
        let mut timestamp = self.start;

        for i in 0..self.points {
            if i > 0 {
                timestamp = timestamp.checked_add_signed(self.interval).ok_or_else(|| {
                    ScheduleError::InvalidForecast(format!(
                        "sample {i} lies beyond the supported date range ({} min spacing from {})",
                        self.interval.num_minutes(),
                        self.start
                    ))
                })?;
            }
            let (base, variation) = hourly_band(timestamp.hour());
            let ripple = ((i % 7) as f64 - 3.0) * variation / 10.0;
            let noise = gaussian_noise(&mut rng, self.noise_std);
            samples.push(Sample::new(timestamp, (base + ripple + noise).max(0.0)));
        }

        Ok(samples)
    }

    /// Generates the samples and validates them into a series.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidForecast`] when fewer than two points
    /// are requested, `interval` is not positive, or the timestamps overflow.
    pub fn build(&self, interpolation: Interpolation) -> Result<ForecastSeries> {
        ForecastSeries::with_interpolation(self.samples()?, interpolation)
    }
}

/// Rounds down to `:00` or `:30` and drops seconds.
pub fn align_to_half_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let minute = if t.minute() < 30 { 0 } else { 30 };
    t.with_minute(minute)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Base intensity and ripple amplitude (gCO2/kWh) for an hour of the day.
fn hourly_band(hour: u32) -> (f64, f64) {
    match hour {
        2..=5 => (90.0, 20.0),
        6..=8 => (150.0, 30.0),
        9..=16 => (180.0, 40.0),
        17..=21 => (250.0, 30.0),
        _ => (140.0, 30.0),
    }
}

/// Gaussian noise via the Box-Muller transform.
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
