//! I/O error types for glycotree-io.

use std::path::PathBuf;

/// Errors from fetching, parsing and writing pipeline data.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the HTTP request cannot be built or sent, or the body cannot be read.
    #[error("failed to fetch {url}")]
    Fetch {
        /// URL that was requested.
        url: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },

    /// Returned when the server answers with a non-success status.
    #[error("fetching {url} returned HTTP {status}")]
    HttpStatus {
        /// URL that was requested.
        url: String,
        /// HTTP status code received.
        status: u16,
    },

    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {origin} at line {line}")]
    CsvParse {
        /// Where the CSV came from (URL or path).
        origin: String,
        /// One-based line where the error occurred, 0 if unknown.
        line: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the CSV contains zero data rows.
    #[error("empty dataset (no data rows) in {origin}")]
    EmptyDataset {
        /// Where the CSV came from.
        origin: String,
    },

    /// Returned when a data row does not have exactly nine fields.
    #[error("inconsistent row length in {origin}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Where the CSV came from.
        origin: String,
        /// Zero-based data row index.
        row_index: usize,
        /// Expected number of columns.
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when a measurement is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {origin}: row {row_index}, column {column}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Where the CSV came from.
        origin: String,
        /// Zero-based data row index.
        row_index: usize,
        /// Name of the offending column.
        column: &'static str,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when the Outcome column holds something other than 0 or 1.
    #[error("invalid outcome in {origin}: row {row_index}, raw value \"{raw}\" (expected 0 or 1)")]
    InvalidOutcome {
        /// Where the CSV came from.
        origin: String,
        /// Zero-based data row index.
        row_index: usize,
        /// The raw string value.
        raw: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the run report cannot be encoded as JSON.
    #[error("cannot serialize run report")]
    Serialize {
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}
