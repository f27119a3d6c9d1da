//! Line-format parser for sensor reports
//!
//! Devices submit newline-delimited plain text in one of two fixed formats.
//!
//! Location report (four lines):
//!
//! ```text
//! -33.45,-70.66
//! 5.0 m
//! 2025-07-29 14:23:45
//! SensorA
//! ```
//!
//! Climate report (the same four lines followed by a sensor log line):
//!
//! ```text
//! Temp: 21.3°C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms
//! ```
//!
//! ## Architecture
//!
//! - [`parser`] - Report-level orchestration shared by both formats
//! - [`field_parsers`] - Single-line parsers and validation
//! - [`error`] - The [`FormatError`] taxonomy returned to clients
//!
//! ## Usage
//!
//! ```rust
//! use coap_ingest::app::services::report_parser::ReportParser;
//! use coap_ingest::Route;
//!
//! let parser = ReportParser::default();
//! let payload = b"-33.45,-70.66\n5.0 m\n2025-07-29 14:23:45\nSensorA";
//! let report = parser.parse(Route::Location, payload).unwrap();
//! assert_eq!(report.device_name(), "SensorA");
//! ```

pub mod error;
pub mod field_parsers;
pub mod parser;

#[cfg(test)]
pub mod tests;

// Re-export main types for easy access
pub use error::FormatError;
pub use parser::{ReportParser, parse_climate_report, parse_location_report};
