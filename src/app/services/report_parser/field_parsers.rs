//! Field parsing utilities for report lines
//!
//! Each function validates a single line of a report and either returns the
//! typed value or the [`FormatError`] describing why the line was rejected.
//! Numeric fields accept anything `f64` parses to a finite value; no range
//! checks are applied.

use super::error::FormatError;
use crate::app::models::ClimateReadings;
use crate::config::TimestampZone;
use crate::constants::REPORT_TIMESTAMP_FORMAT;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// `<digits and dots><optional whitespace>m`
static PRECISION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\d.]+)\s*m$").expect("precision pattern is valid"));

/// `Temp: <n>°C Humidity: <n>% Pressure: <n> kPa Gas: <n> Ohms`
static SENSOR_LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Temp:\s*([-\d.]+)\s*°C\s+Humidity:\s*([-\d.]+)\s*%\s+Pressure:\s*([-\d.]+)\s*kPa\s+Gas:\s*([-\d.]+)\s*Ohms",
    )
    .expect("sensor line pattern is valid")
});

/// Trim the payload and split it into lines, requiring an exact count
///
/// Lines end at `\n`; a `\r` before it is dropped so CRLF payloads behave
/// the same as LF ones.
pub fn split_report_lines(text: &str, expected: usize) -> Result<Vec<&str>, FormatError> {
    let lines: Vec<&str> = text
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if lines.len() != expected {
        return Err(FormatError::LineCount {
            expected,
            found: lines.len(),
        });
    }

    Ok(lines)
}

/// Parse `latitude,longitude`, splitting on the first comma
pub fn parse_coordinates(line: &str) -> Result<(f64, f64), FormatError> {
    let invalid = || FormatError::InvalidCoordinates {
        line: line.to_string(),
    };

    let (lat_str, lng_str) = line.split_once(',').ok_or_else(invalid)?;
    let latitude = parse_finite(lat_str).ok_or_else(invalid)?;
    let longitude = parse_finite(lng_str).ok_or_else(invalid)?;

    Ok((latitude, longitude))
}

/// Parse a precision line such as `5.0 m` or `5.0m`
pub fn parse_precision(line: &str) -> Result<f64, FormatError> {
    let trimmed = line.trim();

    PRECISION_PATTERN
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_finite(m.as_str()))
        .ok_or_else(|| FormatError::InvalidPrecision {
            line: line.to_string(),
        })
}

/// Parse a `YYYY-MM-DD HH:MM:SS` timestamp and normalize it to UTC
///
/// Local times that fall into a DST gap are rejected; ambiguous local times
/// resolve to the earlier instant.
pub fn parse_timestamp(line: &str, zone: TimestampZone) -> Result<DateTime<Utc>, FormatError> {
    let trimmed = line.trim();
    let invalid = || FormatError::InvalidDate {
        line: line.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(trimmed, REPORT_TIMESTAMP_FORMAT)
        .map_err(|_| invalid())?;

    match zone {
        TimestampZone::Utc => Ok(naive.and_utc()),
        TimestampZone::Local => Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(invalid),
    }
}

/// Parse the device name line; it must not be blank
pub fn parse_device_name(line: &str) -> Result<String, FormatError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(FormatError::EmptyDeviceName);
    }
    Ok(trimmed.to_string())
}

/// Parse the climate sensor log line into its four readings
pub fn parse_sensor_line(line: &str) -> Result<ClimateReadings, FormatError> {
    let trimmed = line.trim();
    let invalid = || FormatError::InvalidSensorLine {
        line: line.to_string(),
    };

    let caps = SENSOR_LINE_PATTERN.captures(trimmed).ok_or_else(invalid)?;
    let reading = |index: usize| {
        caps.get(index)
            .and_then(|m| parse_finite(m.as_str()))
            .ok_or_else(invalid)
    };

    Ok(ClimateReadings {
        temperature_c: reading(1)?,
        humidity_percent: reading(2)?,
        pressure_kpa: reading(3)?,
        gas_resistance_ohms: reading(4)?,
    })
}

/// Parse a trimmed string as a finite `f64`
///
/// `inf` and `NaN` are valid `f64` syntax but never valid report values.
pub fn parse_finite(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}
