//! CSV export of scored candidate windows.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::optimizer::Window;

/// Column header for candidate export.
const HEADER: &str = "start,end,mean_intensity_g_per_kwh,is_best";

fn rfc3339(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Exports candidate windows to a CSV file at the given path.
///
/// Writes a header row followed by one row per window. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `windows` - Scored candidates in start order
/// * `best` - The selected window; its row is flagged `is_best = true`
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(windows: &[Window], best: &Window, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(windows, best, buf)
}

/// Writes candidate windows as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(windows: &[Window], best: &Window, writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for w in windows {
        wtr.write_record(&[
            rfc3339(w.start),
            rfc3339(w.end),
            format!("{:.4}", w.mean_intensity),
            (w.start == best.start).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
