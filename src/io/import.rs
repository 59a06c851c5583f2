//! CSV import of forecast samples.
//!
//! Expected layout:
//!
//! ```text
//! timestamp,intensity
//! 2024-05-01T00:00:00Z,250
//! 2024-05-01T00:30:00Z,247.5
//! ```

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::error::ScheduleError;
use crate::forecast::{ForecastSeries, Interpolation, Sample};

/// Failure while loading a forecast file.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read forecast \"{}\": {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed forecast CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Forecast(#[from] ScheduleError),
}

#[derive(Debug, Deserialize)]
struct ForecastRecord {
    timestamp: DateTime<Utc>,
    intensity: f64,
}

/// Reads `timestamp,intensity` rows and validates them into a series.
///
/// # Errors
///
/// [`ImportError::Csv`] for unparseable rows (the message carries the line),
/// [`ImportError::Forecast`] when the rows do not form a valid series.
pub fn read_forecast(
    reader: impl Read,
    interpolation: Interpolation,
) -> Result<ForecastSeries, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let samples = rdr
        .deserialize::<ForecastRecord>()
        .map(|row| row.map(|r| Sample::new(r.timestamp, r.intensity)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ForecastSeries::with_interpolation(samples, interpolation)?)
}

/// Opens `path` and delegates to [`read_forecast`].
///
/// # Errors
///
/// [`ImportError::Io`] if the file cannot be opened, otherwise as
/// [`read_forecast`].
pub fn read_forecast_from_path(
    path: &Path,
    interpolation: Interpolation,
) -> Result<ForecastSeries, ImportError> {
    let file = File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_forecast(std::io::BufReader::new(file), interpolation)
}
