//! Report-level parsing shared by the location and climate formats
//!
//! Both formats begin with the same four lines, so a single routine parses
//! that common prefix for a given total line count and the climate path
//! extends the resulting [`LocationRecord`] with its sensor readings.

use super::error::FormatError;
use super::field_parsers::{
    parse_coordinates, parse_device_name, parse_precision, parse_sensor_line, parse_timestamp,
    split_report_lines,
};
use crate::app::models::{ClimateRecord, LocationRecord, Report, Route};
use crate::config::TimestampZone;
use crate::constants::report_lines;
use tracing::debug;

/// Stateless parser for both report formats
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportParser {
    timestamp_zone: TimestampZone,
}

impl ReportParser {
    pub fn new(timestamp_zone: TimestampZone) -> Self {
        Self { timestamp_zone }
    }

    /// Parse a payload with the format the route expects
    pub fn parse(&self, route: Route, payload: &[u8]) -> Result<Report, FormatError> {
        match route {
            Route::Location => self.parse_location(payload).map(Report::Location),
            Route::Climate => self.parse_climate(payload).map(Report::Climate),
        }
    }

    /// Parse a four-line location report
    pub fn parse_location(&self, payload: &[u8]) -> Result<LocationRecord, FormatError> {
        let text = String::from_utf8_lossy(payload);
        let (record, _) = self.parse_common(&text, report_lines::LOCATION)?;
        Ok(record)
    }

    /// Parse a five-line climate report
    pub fn parse_climate(&self, payload: &[u8]) -> Result<ClimateRecord, FormatError> {
        let text = String::from_utf8_lossy(payload);
        let (location, lines) = self.parse_common(&text, report_lines::CLIMATE)?;
        let readings = parse_sensor_line(lines[4])?;

        Ok(ClimateRecord { location, readings })
    }

    /// Parse the four lines every report starts with
    ///
    /// Returns the base record together with all split lines so callers can
    /// continue with any lines past the fourth.
    fn parse_common<'a>(
        &self,
        text: &'a str,
        expected_lines: usize,
    ) -> Result<(LocationRecord, Vec<&'a str>), FormatError> {
        let lines = split_report_lines(text, expected_lines)?;

        let (latitude, longitude) = parse_coordinates(lines[0])?;
        let precision_meters = parse_precision(lines[1])?;
        let timestamp = parse_timestamp(lines[2], self.timestamp_zone)?;
        let device_name = parse_device_name(lines[3])?;

        debug!(
            "Parsed report from '{}' at ({}, {}) +/- {} m",
            device_name, latitude, longitude, precision_meters
        );

        let record = LocationRecord {
            latitude,
            longitude,
            precision_meters,
            timestamp,
            device_name,
            raw: text.to_string(),
        };

        Ok((record, lines))
    }
}

/// Parse a location report, interpreting its timestamp as UTC
pub fn parse_location_report(payload: &[u8]) -> Result<LocationRecord, FormatError> {
    ReportParser::default().parse_location(payload)
}

/// Parse a climate report, interpreting its timestamp as UTC
pub fn parse_climate_report(payload: &[u8]) -> Result<ClimateRecord, FormatError> {
    ReportParser::default().parse_climate(payload)
}
