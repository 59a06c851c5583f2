//! Sliding-window search for the lowest-carbon job start.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::forecast::ForecastSeries;

/// Default spacing between candidate starts, in minutes.
pub const DEFAULT_STEP_MINUTES: i64 = 30;

/// Mean intensities closer than this are treated as equal.
pub const DEFAULT_TIE_EPSILON: f64 = 1e-9;

/// A candidate execution interval and its mean carbon intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Window {
    /// Job start.
    pub start: DateTime<Utc>,
    /// Job end (`start + duration`).
    pub end: DateTime<Utc>,
    /// Time-weighted mean intensity over the window (gCO2/kWh).
    pub mean_intensity: f64,
}

impl Window {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Outcome of a single window search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    /// Lowest-mean window (earliest one on ties).
    pub best: Window,
    /// Window starting at the first forecast sample ("run now").
    pub current: Window,
    /// `1 - best / current`, clamped to `[0, 1]`; zero when the baseline is zero.
    pub savings_fraction: f64,
    /// Number of candidate windows scored.
    pub candidates_evaluated: usize,
}

impl OptimizationResult {
    /// How long the job waits compared with starting immediately.
    pub fn delay(&self) -> TimeDelta {
        self.best.start - self.current.start
    }

    /// `true` when the best window is the immediate one.
    pub fn is_immediate(&self) -> bool {
        self.best.start == self.current.start
    }
}

fn savings_fraction(best: f64, current: f64) -> f64 {
    if current > 0.0 {
        (1.0 - best / current).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Stateless window search over a [`ForecastSeries`].
///
/// Candidates start at the first sample and advance by `step` while the whole
/// job still fits. The exact right-edge start `end - duration` is always
/// scored as well, even when it is off the step grid, so quantization never
/// hides an optimum at the end of the horizon.
///
/// # Examples
///
/// ```
/// use carbon_window::forecast::{ForecastSeries, Sample};
/// use carbon_window::optimizer::WindowOptimizer;
/// use chrono::{TimeDelta, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
/// let series = ForecastSeries::new(
///     [300.0, 200.0, 100.0]
///         .iter()
///         .enumerate()
///         .map(|(h, &v)| Sample::new(t0 + TimeDelta::hours(h as i64), v))
///         .collect(),
/// )
/// .unwrap();
///
/// let result = WindowOptimizer::new(TimeDelta::hours(1))
///     .find_optimal_start(&series, TimeDelta::hours(1))
///     .unwrap();
/// assert_eq!(result.best.start, t0 + TimeDelta::hours(1));
/// assert_eq!(result.best.mean_intensity, 150.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowOptimizer {
    step: TimeDelta,
    tie_epsilon: f64,
    max_window: Option<TimeDelta>,
}

impl Default for WindowOptimizer {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(DEFAULT_STEP_MINUTES))
    }
}

impl WindowOptimizer {
    /// Creates an optimizer scoring candidates every `step`.
    pub fn new(step: TimeDelta) -> Self {
        Self {
            step,
            tie_epsilon: DEFAULT_TIE_EPSILON,
            max_window: None,
        }
    }

    /// Overrides the tie tolerance.
    pub fn with_tie_epsilon(mut self, tie_epsilon: f64) -> Self {
        self.tie_epsilon = tie_epsilon;
        self
    }

    /// Only consider windows that finish within `max_window` of the first
    /// sample.
    pub fn with_max_window(mut self, max_window: TimeDelta) -> Self {
        self.max_window = Some(max_window);
        self
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn tie_epsilon(&self) -> f64 {
        self.tie_epsilon
    }

    pub fn max_window(&self) -> Option<TimeDelta> {
        self.max_window
    }

    /// Last instant a window may end at.
    fn search_end(&self, series: &ForecastSeries) -> DateTime<Utc> {
        match self.max_window {
            Some(limit) => series
                .start()
                .checked_add_signed(limit)
                .map_or(series.end(), |end| end.min(series.end())),
            None => series.end(),
        }
    }

    /// Validates a query and returns the latest feasible start.
    fn last_start(&self, series: &ForecastSeries, duration: TimeDelta) -> Result<DateTime<Utc>> {
        if self.step <= TimeDelta::zero() {
            return Err(ScheduleError::InvalidStep { step: self.step });
        }

        let start = series.start();
        if duration <= TimeDelta::zero() {
            return Err(ScheduleError::EmptyWindow {
                start,
                end: start.checked_add_signed(duration).unwrap_or(start),
            });
        }

        let end = self.search_end(series);
        let horizon = end - start;
        if duration > horizon {
            return Err(ScheduleError::DurationExceedsHorizon { duration, horizon });
        }

        Ok(end - duration)
    }

    /// Candidate start times in ascending order: the step grid from the first
    /// sample, then the right edge if the grid missed it.
    ///
    /// # Errors
    ///
    /// [`ScheduleError::InvalidStep`], [`ScheduleError::EmptyWindow`] for a
    /// non-positive duration, or [`ScheduleError::DurationExceedsHorizon`].
    pub fn candidate_starts(
        &self,
        series: &ForecastSeries,
        duration: TimeDelta,
    ) -> Result<Vec<DateTime<Utc>>> {
        let last = self.last_start(series, duration)?;

        let mut starts = Vec::new();
        let mut s = series.start();
        while s <= last {
            starts.push(s);
            match s.checked_add_signed(self.step) {
                Some(next) => s = next,
                None => break,
            }
        }
        if starts.last() != Some(&last) {
            starts.push(last);
        }

        Ok(starts)
    }

    /// Scores every candidate window, in start order.
    ///
    /// # Errors
    ///
    /// Same as [`WindowOptimizer::candidate_starts`], plus anything raised by
    /// [`ForecastSeries::mean_intensity`].
    pub fn evaluate_candidates(
        &self,
        series: &ForecastSeries,
        duration: TimeDelta,
    ) -> Result<Vec<Window>> {
        self.candidate_starts(series, duration)?
            .into_iter()
            .map(|start| {
                let end = start + duration;
                Ok(Window {
                    start,
                    end,
                    mean_intensity: series.mean_intensity(start, end)?,
                })
            })
            .collect()
    }

    /// Finds the window of length `duration` with the lowest mean intensity.
    ///
    /// Every candidate within `tie_epsilon` of the minimum counts as a tie and
    /// the earliest of them wins.
    ///
    /// # Errors
    ///
    /// Same as [`WindowOptimizer::evaluate_candidates`].
    pub fn find_optimal_start(
        &self,
        series: &ForecastSeries,
        duration: TimeDelta,
    ) -> Result<OptimizationResult> {
        self.search(series, duration).map(|(result, _)| result)
    }

    /// Like [`WindowOptimizer::find_optimal_start`], also returning every
    /// scored candidate in start order.
    ///
    /// # Errors
    ///
    /// Same as [`WindowOptimizer::evaluate_candidates`].
    pub fn search(
        &self,
        series: &ForecastSeries,
        duration: TimeDelta,
    ) -> Result<(OptimizationResult, Vec<Window>)> {
        let windows = self.evaluate_candidates(series, duration)?;
        let result = self
            .select(&windows)
            .ok_or_else(|| ScheduleError::DurationExceedsHorizon {
                duration,
                horizon: self.search_end(series) - series.start(),
            })?;

        debug!(
            candidates = windows.len(),
            best_start = %result.best.start,
            best_mean = result.best.mean_intensity,
            current_mean = result.current.mean_intensity,
            "window search complete"
        );

        Ok((result, windows))
    }

    /// Picks the earliest window whose mean is within `tie_epsilon` of the
    /// lowest mean. `None` for an empty slice.
    pub fn select(&self, windows: &[Window]) -> Option<OptimizationResult> {
        let current = *windows.first()?;
        let min = windows
            .iter()
            .map(|w| w.mean_intensity)
            .fold(f64::INFINITY, f64::min);
        let best = *windows
            .iter()
            .find(|w| w.mean_intensity <= min + self.tie_epsilon)?;

        Some(OptimizationResult {
            best,
            current,
            savings_fraction: savings_fraction(best.mean_intensity, current.mean_intensity),
            candidates_evaluated: windows.len(),
        })
    }
}

/// One-shot search with the default tie tolerance and no search limit.
///
/// # Errors
///
/// See [`WindowOptimizer::find_optimal_start`].
pub fn find_optimal_start(
    series: &ForecastSeries,
    duration: TimeDelta,
    step: TimeDelta,
) -> Result<OptimizationResult> {
    WindowOptimizer::new(step).find_optimal_start(series, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::Sample;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn hourly(values: &[f64]) -> ForecastSeries {
        ForecastSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(h, &v)| Sample::new(t0() + TimeDelta::hours(h as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn grid_candidates_cover_horizon() {
        let series = hourly(&[1.0, 1.0, 1.0, 1.0, 1.0]);
        let starts = WindowOptimizer::new(TimeDelta::hours(1))
            .candidate_starts(&series, TimeDelta::hours(2))
            .unwrap();
        let hours: Vec<i64> = starts.iter().map(|s| (*s - t0()).num_hours()).collect();
        assert_eq!(hours, vec![0, 1, 2]);
    }

    #[test]
    fn off_grid_right_edge_is_appended() {
        let series = hourly(&[1.0, 1.0, 1.0, 1.0]);
        let starts = WindowOptimizer::new(TimeDelta::minutes(50))
            .candidate_starts(&series, TimeDelta::hours(1))
            .unwrap();
        let minutes: Vec<i64> = starts.iter().map(|s| (*s - t0()).num_minutes()).collect();
        assert_eq!(minutes, vec![0, 50, 100, 120]);
    }

    #[test]
    fn duration_equal_to_horizon_has_single_candidate() {
        let series = hourly(&[100.0, 200.0, 300.0]);
        let result = WindowOptimizer::new(TimeDelta::hours(1))
            .find_optimal_start(&series, TimeDelta::hours(2))
            .unwrap();
        assert_eq!(result.candidates_evaluated, 1);
        assert_eq!(result.best, result.current);
        assert_eq!(result.savings_fraction, 0.0);
        assert!(result.is_immediate());
    }

    #[test]
    fn duration_longer_than_horizon_fails() {
        let series = hourly(&[100.0, 200.0, 300.0]);
        let err = find_optimal_start(&series, TimeDelta::minutes(121), TimeDelta::hours(1))
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::DurationExceedsHorizon {
                duration: TimeDelta::minutes(121),
                horizon: TimeDelta::hours(2),
            }
        );
    }

    #[test]
    fn non_positive_duration_is_empty_window() {
        let series = hourly(&[100.0, 200.0]);
        for d in [TimeDelta::zero(), TimeDelta::minutes(-5)] {
            let err = find_optimal_start(&series, d, TimeDelta::hours(1)).unwrap_err();
            assert!(matches!(err, ScheduleError::EmptyWindow { .. }), "{d}");
        }
    }

    #[test]
    fn non_positive_step_is_rejected() {
        let series = hourly(&[100.0, 200.0]);
        let err = find_optimal_start(&series, TimeDelta::minutes(30), TimeDelta::zero())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidStep { .. }));
    }

    #[test]
    fn earliest_candidate_wins_ties() {
        let series = hourly(&[300.0, 100.0, 100.0, 300.0, 100.0, 100.0, 300.0]);
        let result = find_optimal_start(&series, TimeDelta::hours(1), TimeDelta::hours(1))
            .unwrap();
        assert_eq!(result.best.start, t0() + TimeDelta::hours(1));
        assert_eq!(result.best.mean_intensity, 100.0);
    }

    #[test]
    fn differences_within_epsilon_count_as_ties() {
        let series = hourly(&[200.0, 100.0, 100.0, 200.0, 99.9, 99.9, 200.0]);
        let loose = WindowOptimizer::new(TimeDelta::hours(1)).with_tie_epsilon(0.5);
        let result = loose.find_optimal_start(&series, TimeDelta::hours(1)).unwrap();
        assert_eq!(result.best.start, t0() + TimeDelta::hours(1));

        let strict = WindowOptimizer::new(TimeDelta::hours(1));
        let result = strict.find_optimal_start(&series, TimeDelta::hours(1)).unwrap();
        assert_eq!(result.best.start, t0() + TimeDelta::hours(4));
    }

    #[test]
    fn tie_tolerance_is_measured_from_the_minimum() {
        // 1 h windows at 0h, 2h and 4h hold 100.8, 100.4 and 100.0; each is
        // within 0.5 of its neighbour but only 100.4 is within 0.5 of the minimum
        let series = ForecastSeries::with_interpolation(
            [100.8, 300.0, 100.4, 300.0, 100.0, 300.0]
                .iter()
                .enumerate()
                .map(|(h, &v)| Sample::new(t0() + TimeDelta::hours(h as i64), v))
                .collect(),
            crate::forecast::Interpolation::Hold,
        )
        .unwrap();
        let optimizer = WindowOptimizer::new(TimeDelta::hours(2)).with_tie_epsilon(0.5);
        let result = optimizer.find_optimal_start(&series, TimeDelta::hours(1)).unwrap();
        assert_eq!(result.candidates_evaluated, 3);
        assert_eq!(result.best.start, t0() + TimeDelta::hours(2));
        assert!((result.best.mean_intensity - 100.4).abs() < 1e-9);
    }

    #[test]
    fn search_returns_the_scored_candidates() {
        let series = hourly(&[300.0, 200.0, 100.0, 200.0]);
        let optimizer = WindowOptimizer::new(TimeDelta::hours(1));
        let (result, windows) = optimizer.search(&series, TimeDelta::hours(1)).unwrap();
        assert_eq!(windows.len(), result.candidates_evaluated);
        assert_eq!(windows, optimizer.evaluate_candidates(&series, TimeDelta::hours(1)).unwrap());
        assert_eq!(Some(result), optimizer.select(&windows));
        assert_eq!(optimizer.select(&[]), None);
    }

    #[test]
    fn max_window_limits_search() {
        // cleanest hour is at 4h, outside a 3h search limit
        let series = hourly(&[300.0, 250.0, 200.0, 200.0, 50.0, 50.0]);
        let limited = WindowOptimizer::new(TimeDelta::hours(1)).with_max_window(TimeDelta::hours(3));
        let result = limited.find_optimal_start(&series, TimeDelta::hours(1)).unwrap();
        assert_eq!(result.best.start, t0() + TimeDelta::hours(2));
        assert!(result.best.end <= t0() + TimeDelta::hours(3));

        let err = limited
            .find_optimal_start(&series, TimeDelta::hours(4))
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::DurationExceedsHorizon {
                duration: TimeDelta::hours(4),
                horizon: TimeDelta::hours(3),
            }
        );
    }

    #[test]
    fn max_window_beyond_series_uses_series_end() {
        let series = hourly(&[300.0, 200.0, 100.0]);
        let result = WindowOptimizer::new(TimeDelta::hours(1))
            .with_max_window(TimeDelta::hours(48))
            .find_optimal_start(&series, TimeDelta::hours(1))
            .unwrap();
        assert_eq!(result.best.start, t0() + TimeDelta::hours(1));
    }

    #[test]
    fn zero_baseline_reports_zero_savings() {
        let series = hourly(&[0.0, 0.0, 0.0]);
        let result = find_optimal_start(&series, TimeDelta::hours(1), TimeDelta::hours(1))
            .unwrap();
        assert_eq!(result.savings_fraction, 0.0);
        assert_eq!(result.best.start, t0());
    }

    #[test]
    fn delay_measures_wait_from_now() {
        let series = hourly(&[300.0, 300.0, 100.0, 100.0]);
        let result = find_optimal_start(&series, TimeDelta::hours(1), TimeDelta::hours(1))
            .unwrap();
        assert_eq!(result.delay(), TimeDelta::hours(2));
        assert!(!result.is_immediate());
        assert_eq!(result.best.duration(), TimeDelta::hours(1));
    }

    #[test]
    fn savings_fraction_is_clamped() {
        assert_eq!(savings_fraction(90.0, 250.0), 1.0 - 90.0 / 250.0);
        assert_eq!(savings_fraction(300.0, 250.0), 0.0);
        assert_eq!(savings_fraction(0.0, 250.0), 1.0);
        assert_eq!(savings_fraction(10.0, 0.0), 0.0);
    }
}
