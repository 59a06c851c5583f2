//! API response and query types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::{ForecastSeries, Interpolation, Sample};

/// Loaded forecast as returned by `GET /forecast`.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub interpolation: Interpolation,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub samples: Vec<Sample>,
}

impl From<&ForecastSeries> for ForecastResponse {
    fn from(series: &ForecastSeries) -> Self {
        Self {
            interpolation: series.interpolation(),
            start: series.start(),
            end: series.end(),
            samples: series.samples().to_vec(),
        }
    }
}

/// Optional overrides for the optimize endpoint.
#[derive(Debug, Deserialize)]
pub struct OptimizeQuery {
    /// Job duration in minutes.
    pub duration_minutes: Option<u32>,
    /// Candidate spacing in minutes.
    pub step_minutes: Option<u32>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn forecast_response_mirrors_series() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let series = ForecastSeries::with_interpolation(
            vec![
                Sample::new(t0, 200.0),
                Sample::new(t0 + TimeDelta::minutes(30), 180.0),
            ],
            Interpolation::Hold,
        )
        .unwrap();

        let resp = ForecastResponse::from(&series);
        assert_eq!(resp.interpolation, Interpolation::Hold);
        assert_eq!(resp.start, t0);
        assert_eq!(resp.end, t0 + TimeDelta::minutes(30));
        assert_eq!(resp.samples.len(), 2);
    }
}
