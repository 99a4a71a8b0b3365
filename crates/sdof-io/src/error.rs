//! Error types for sdof-io

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecordFormatError>;

/// Malformed or inconsistent ground-motion record input.
///
/// Raised by the record reader before any model construction happens.
#[derive(Error, Debug)]
pub enum RecordFormatError {
    #[error("record header ended before the NPTS/DT line")]
    TruncatedHeader,

    #[error("could not locate {field} in the record header line: {line:?}")]
    MissingHeaderField { field: &'static str, line: String },

    #[error("invalid {field} value {value:?} in record header")]
    BadHeaderValue { field: &'static str, value: String },

    #[error("invalid sample {value:?} at position {index}")]
    BadSample { index: usize, value: String },

    #[error("header declares NPTS={declared} but the body holds {parsed} samples")]
    SampleCountMismatch { declared: usize, parsed: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
