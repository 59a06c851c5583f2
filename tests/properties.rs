//! Property tests for forecast evaluation and window search.

mod common;

use carbon_window::forecast::{ForecastSeries, Interpolation, Sample};
use carbon_window::optimizer::WindowOptimizer;
use chrono::TimeDelta;
use proptest::prelude::*;

/// Irregularly spaced series of 2..24 samples with 1..=120 minute gaps.
fn series_strategy() -> impl Strategy<Value = ForecastSeries> {
    (
        prop::collection::vec((1i64..=120, 0.0f64..1000.0), 1..24),
        0.0f64..1000.0,
        prop_oneof![Just(Interpolation::Linear), Just(Interpolation::Hold)],
    )
        .prop_map(|(steps, first, interpolation)| {
            let mut t = common::t0();
            let mut samples = vec![Sample::new(t, first)];
            for (gap, value) in steps {
                t += TimeDelta::minutes(gap);
                samples.push(Sample::new(t, value));
            }
            ForecastSeries::with_interpolation(samples, interpolation).unwrap()
        })
}

fn bounds(series: &ForecastSeries) -> (f64, f64) {
    series
        .samples()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
            (lo.min(s.intensity), hi.max(s.intensity))
        })
}

proptest! {
    #[test]
    fn mean_stays_within_sample_range(
        series in series_strategy(),
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        let horizon = series.horizon().num_seconds();
        let (lo_frac, hi_frac) = if a < b { (a, b) } else { (b, a) };
        let start = series.start() + TimeDelta::seconds((horizon as f64 * lo_frac) as i64);
        let end = series.start() + TimeDelta::seconds((horizon as f64 * hi_frac) as i64);
        prop_assume!(start < end);

        let mean = series.mean_intensity(start, end).unwrap();
        let (lo, hi) = bounds(&series);
        prop_assert!(mean >= lo - 1e-6 && mean <= hi + 1e-6, "{mean} not in [{lo}, {hi}]");
    }

    #[test]
    fn window_means_are_additive(series in series_strategy(), split in 0.05f64..0.95) {
        let (start, end) = (series.start(), series.end());
        let horizon = series.horizon().num_seconds();
        let mid = start + TimeDelta::seconds((horizon as f64 * split) as i64);
        prop_assume!(start < mid && mid < end);

        let secs = |a: chrono::DateTime<chrono::Utc>, b: chrono::DateTime<chrono::Utc>| {
            (b - a).num_seconds() as f64
        };
        let whole = series.mean_intensity(start, end).unwrap() * secs(start, end);
        let left = series.mean_intensity(start, mid).unwrap() * secs(start, mid);
        let right = series.mean_intensity(mid, end).unwrap() * secs(mid, end);
        prop_assert!((whole - (left + right)).abs() <= 1e-6 * whole.abs().max(1.0));
    }

    #[test]
    fn linear_signal_has_no_jumps(series in series_strategy()) {
        prop_assume!(series.interpolation() == Interpolation::Linear);
        for pair in series.samples().windows(2) {
            let just_before = pair[1].timestamp - TimeDelta::milliseconds(1);
            let v = series.intensity_at(just_before).unwrap();
            let gap = (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64;
            let max_jump = (pair[1].intensity - pair[0].intensity).abs() / gap;
            prop_assert!((v - pair[1].intensity).abs() <= max_jump + 1e-6);
        }
    }

    #[test]
    fn sliding_window_mean_is_continuous(series in series_strategy(), frac in 0.05f64..0.9) {
        let horizon_ms = series.horizon().num_milliseconds();
        let duration = TimeDelta::milliseconds(((horizon_ms as f64) * frac) as i64);
        prop_assume!(duration > TimeDelta::milliseconds(10));

        let nudge = TimeDelta::milliseconds(1);
        let (lo, hi) = bounds(&series);
        let limit = (hi - lo) * 2.0 / duration.num_milliseconds() as f64 + 1e-6;

        // slide each window edge across each sample boundary
        for sample in series.samples() {
            for start in [sample.timestamp, sample.timestamp - duration] {
                let before = start - nudge;
                let after = start + nudge;
                if before < series.start() || after + duration > series.end() {
                    continue;
                }
                let m_before = series.mean_intensity(before, before + duration).unwrap();
                let m_after = series.mean_intensity(after, after + duration).unwrap();
                prop_assert!(
                    (m_after - m_before).abs() <= limit,
                    "{:?} mean jumped from {m_before} to {m_after} at {start}",
                    series.interpolation()
                );
            }
        }
    }

    #[test]
    fn best_window_is_no_worse_than_any_candidate(
        series in series_strategy(),
        duration_frac in 0.05f64..1.0,
        step_minutes in 1i64..180,
    ) {
        let duration = TimeDelta::minutes(
            ((series.horizon().num_minutes() as f64) * duration_frac).max(1.0) as i64,
        );
        let optimizer = WindowOptimizer::new(TimeDelta::minutes(step_minutes));
        let windows = optimizer.evaluate_candidates(&series, duration).unwrap();
        let result = optimizer.find_optimal_start(&series, duration).unwrap();

        prop_assert_eq!(result.candidates_evaluated, windows.len());
        prop_assert_eq!(result.current, windows[0]);
        prop_assert!(windows.contains(&result.best));
        for w in &windows {
            prop_assert!(result.best.mean_intensity <= w.mean_intensity + 1e-9);
            prop_assert!(w.end <= series.end());
        }
        prop_assert!((0.0..=1.0).contains(&result.savings_fraction));
    }
}
