//! CSV input and output.

/// Candidate window export.
pub mod export;
/// Forecast import.
pub mod import;
