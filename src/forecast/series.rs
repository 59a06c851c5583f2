//! Validated carbon-intensity forecast with continuous-time evaluation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// One forecast point: grid carbon intensity (gCO2/kWh) at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant the intensity applies to.
    pub timestamp: DateTime<Utc>,
    /// Carbon intensity in gCO2/kWh (finite, >= 0).
    pub intensity: f64,
}

impl Sample {
    /// Creates a sample. Validation happens when the series is built.
    pub fn new(timestamp: DateTime<Utc>, intensity: f64) -> Self {
        Self {
            timestamp,
            intensity,
        }
    }
}

/// How the signal behaves between two consecutive samples.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Straight line between neighbouring samples; means are trapezoid areas.
    #[default]
    Linear,
    /// Each sample's value holds until the next sample.
    Hold,
}

impl Interpolation {
    /// Accepted spellings for config files and the command line.
    pub const NAMES: &[&str] = &["linear", "hold"];
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Hold => f.write_str("hold"),
        }
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Self::Linear),
            "hold" => Ok(Self::Hold),
            other => Err(format!(
                "unknown interpolation \"{other}\", expected one of: {}",
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Converts a `TimeDelta` to fractional seconds without losing sub-second
/// precision.
pub(crate) fn seconds(delta: TimeDelta) -> f64 {
    delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) * 1e-9
}

/// Ordered, immutable carbon-intensity forecast over `[start, end]`.
///
/// The series models a continuous signal: [`intensity_at`](Self::intensity_at)
/// answers point queries and [`mean_intensity`](Self::mean_intensity) returns
/// the exact time-weighted average of the interpolant over any sub-interval,
/// including windows whose edges fall between samples.
///
/// # Examples
///
/// ```
/// use carbon_window::forecast::{ForecastSeries, Sample};
/// use chrono::{TimeDelta, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let series = ForecastSeries::new(vec![
///     Sample::new(t0, 100.0),
///     Sample::new(t0 + TimeDelta::hours(1), 200.0),
/// ])
/// .unwrap();
///
/// let mid = t0 + TimeDelta::minutes(30);
/// assert_eq!(series.intensity_at(mid).unwrap(), 150.0);
/// assert_eq!(series.mean_intensity(t0, series.end()).unwrap(), 150.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSeries {
    samples: Vec<Sample>,
    interpolation: Interpolation,
}

impl ForecastSeries {
    /// Builds a linearly interpolated series.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidForecast`] if there are fewer than two
    /// samples, timestamps are not strictly increasing, or any intensity is
    /// negative or non-finite.
    pub fn new(samples: Vec<Sample>) -> Result<Self> {
        Self::with_interpolation(samples, Interpolation::Linear)
    }

    /// Builds a series with an explicit interpolation mode.
    ///
    /// # Errors
    ///
    /// Same as [`ForecastSeries::new`].
    pub fn with_interpolation(samples: Vec<Sample>, interpolation: Interpolation) -> Result<Self> {
        if samples.len() < 2 {
            return Err(ScheduleError::InvalidForecast(format!(
                "need at least 2 samples, got {}",
                samples.len()
            )));
        }

        for (i, s) in samples.iter().enumerate() {
            if !s.intensity.is_finite() || s.intensity < 0.0 {
                return Err(ScheduleError::InvalidForecast(format!(
                    "sample {i} at {} has intensity {}, expected a finite value >= 0",
                    s.timestamp, s.intensity
                )));
            }
        }

        for (i, pair) in samples.windows(2).enumerate() {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ScheduleError::InvalidForecast(format!(
                    "timestamps must be strictly increasing: sample {} ({}) does not follow {}",
                    i + 1,
                    pair[1].timestamp,
                    pair[0].timestamp
                )));
            }
        }

        Ok(Self {
            samples,
            interpolation,
        })
    }

    /// The validated samples in timestamp order.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples (always >= 2).
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; a series holds at least two samples.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// First timestamp of the horizon.
    pub fn start(&self) -> DateTime<Utc> {
        self.samples[0].timestamp
    }

    /// Last timestamp of the horizon.
    pub fn end(&self) -> DateTime<Utc> {
        self.samples[self.samples.len() - 1].timestamp
    }

    /// Length of the covered horizon.
    pub fn horizon(&self) -> TimeDelta {
        self.end() - self.start()
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Interpolated intensity at `t`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::OutOfHorizon`] if `t` is outside
    /// `[start, end]`.
    pub fn intensity_at(&self, t: DateTime<Utc>) -> Result<f64> {
        self.check_bounds(t)?;
        Ok(self.value_in_segment(self.segment_index(t), t))
    }

    /// Time-weighted mean intensity over `[start, end]`.
    ///
    /// Computed as the exact integral of the interpolant divided by the window
    /// length. Whole segments contribute full trapezoids; the two boundary
    /// segments contribute the partial trapezoid between the window edge and
    /// the nearest sample.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::EmptyWindow`] if `start >= end`, then
    /// [`ScheduleError::OutOfHorizon`] if either edge lies outside the series.
    pub fn mean_intensity(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64> {
        if start >= end {
            return Err(ScheduleError::EmptyWindow { start, end });
        }
        self.check_bounds(start)?;
        self.check_bounds(end)?;

        let mut area = 0.0;
        let mut i = self.segment_index(start);
        while i + 1 < self.samples.len() && self.samples[i].timestamp < end {
            let lo = start.max(self.samples[i].timestamp);
            let hi = end.min(self.samples[i + 1].timestamp);
            if hi > lo {
                area += self.segment_area(i, lo, hi);
            }
            i += 1;
        }

        Ok(area / seconds(end - start))
    }

    /// Restricts the series to `[from, to]`.
    ///
    /// Samples strictly inside the range are kept and interpolated samples are
    /// inserted at both cut points, so the restricted series evaluates to the
    /// same values as the original everywhere in `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::EmptyWindow`] if `from >= to`, or
    /// [`ScheduleError::OutOfHorizon`] if the range leaves the horizon.
    pub fn slice(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if from >= to {
            return Err(ScheduleError::EmptyWindow {
                start: from,
                end: to,
            });
        }

        let mut samples = Vec::with_capacity(self.samples.len());
        samples.push(Sample::new(from, self.intensity_at(from)?));
        samples.extend(
            self.samples
                .iter()
                .filter(|s| s.timestamp > from && s.timestamp < to)
                .copied(),
        );
        samples.push(Sample::new(to, self.intensity_at(to)?));

        Self::with_interpolation(samples, self.interpolation)
    }

    fn check_bounds(&self, t: DateTime<Utc>) -> Result<()> {
        if t < self.start() || t > self.end() {
            return Err(ScheduleError::OutOfHorizon {
                at: t,
                start: self.start(),
                end: self.end(),
            });
        }
        Ok(())
    }

    /// Index `i` of the segment `[samples[i], samples[i + 1]]` containing `t`.
    /// The final timestamp maps to the last segment.
    fn segment_index(&self, t: DateTime<Utc>) -> usize {
        let idx = self.samples.partition_point(|s| s.timestamp <= t);
        idx.saturating_sub(1).min(self.samples.len() - 2)
    }

    fn value_in_segment(&self, i: usize, t: DateTime<Utc>) -> f64 {
        let a = &self.samples[i];
        let b = &self.samples[i + 1];
        match self.interpolation {
            Interpolation::Linear => {
                let frac = seconds(t - a.timestamp) / seconds(b.timestamp - a.timestamp);
                a.intensity + (b.intensity - a.intensity) * frac
            }
            Interpolation::Hold => {
                if t >= b.timestamp {
                    b.intensity
                } else {
                    a.intensity
                }
            }
        }
    }

    /// Integral of the signal over `[lo, hi]`, both inside segment `i`.
    fn segment_area(&self, i: usize, lo: DateTime<Utc>, hi: DateTime<Utc>) -> f64 {
        let width = seconds(hi - lo);
        match self.interpolation {
            Interpolation::Linear => {
                0.5 * (self.value_in_segment(i, lo) + self.value_in_segment(i, hi)) * width
            }
            Interpolation::Hold => self.samples[i].intensity * width,
        }
    }
}
