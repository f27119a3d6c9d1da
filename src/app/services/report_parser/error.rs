//! Validation failures raised while parsing a report
//!
//! Every variant is client-caused and maps to a `4.00 Bad Request` reply
//! whose body is `Invalid format: ` followed by the error's display text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("line count mismatch: expected {expected} lines, got {found}")]
    LineCount { expected: usize, found: usize },

    #[error("invalid coordinates: '{line}'")]
    InvalidCoordinates { line: String },

    #[error("invalid precision: '{line}'")]
    InvalidPrecision { line: String },

    #[error("invalid date: '{line}' (expected 'YYYY-MM-DD HH:MM:SS')")]
    InvalidDate { line: String },

    #[error("empty device name")]
    EmptyDeviceName,

    #[error("invalid sensor log line: '{line}'")]
    InvalidSensorLine { line: String },

    /// Parser failed in a way none of the other variants describe
    #[error("unexpected parse failure: {message}")]
    Unexpected { message: String },
}

impl FormatError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }
}
