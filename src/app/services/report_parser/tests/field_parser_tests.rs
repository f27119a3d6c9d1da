//! Tests for single-line field parsers

use super::*;
use crate::app::services::report_parser::FormatError;
use crate::app::services::report_parser::field_parsers::*;
use crate::config::TimestampZone;
use chrono::{Local, NaiveDate, TimeZone, Utc};

#[test]
fn test_split_exact_line_count() {
    let payload = location_payload();
    let lines = split_report_lines(&payload, 4).unwrap();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[3], "SensorA");
}

#[test]
fn test_split_trims_surrounding_whitespace_and_crlf() {
    let text = "\n\n  -33.45,-70.66\r\n5.0 m\r\n2025-07-29 14:23:45\r\nSensorA\r\n\n";
    let lines = split_report_lines(text, 4).unwrap();
    assert_eq!(lines[0], "-33.45,-70.66");
    assert_eq!(lines[1], "5.0 m");
    assert_eq!(lines[3], "SensorA");
}

#[test]
fn test_split_counts_interior_blank_lines() {
    let text = "a\n\nb\nc";
    assert_eq!(
        split_report_lines(text, 3).unwrap_err(),
        FormatError::LineCount {
            expected: 3,
            found: 4
        }
    );
}

#[test]
fn test_split_empty_payload_is_one_line() {
    assert_eq!(
        split_report_lines("   ", 4).unwrap_err(),
        FormatError::LineCount {
            expected: 4,
            found: 1
        }
    );
}

#[test]
fn test_coordinates() {
    assert_eq!(parse_coordinates("-33.45,-70.66").unwrap(), (-33.45, -70.66));
    assert_eq!(parse_coordinates(" 10 , 20.5 ").unwrap(), (10.0, 20.5));
    assert_eq!(parse_coordinates("1e2,-3").unwrap(), (100.0, -3.0));
}

#[test]
fn test_coordinates_out_of_range_are_accepted() {
    assert_eq!(parse_coordinates("123.0,-400.0").unwrap(), (123.0, -400.0));
}

#[test]
fn test_invalid_coordinates() {
    for line in ["-33.45", "abc,1.0", "1.0,", ",1.0", "1.0,2.0,3.0", "NaN,1", "1,inf"] {
        assert!(
            matches!(
                parse_coordinates(line),
                Err(FormatError::InvalidCoordinates { .. })
            ),
            "expected invalid coordinates for {:?}",
            line
        );
    }
}

#[test]
fn test_precision_with_and_without_space() {
    assert_eq!(parse_precision("5.0 m").unwrap(), 5.0);
    assert_eq!(parse_precision("5.0m").unwrap(), 5.0);
    assert_eq!(parse_precision("  12   m  ").unwrap(), 12.0);
    assert_eq!(parse_precision("0.25 m").unwrap(), 0.25);
}

#[test]
fn test_invalid_precision() {
    for line in ["5.0 meters", "5.0", "-5.0 m", "m", "5.0 km", "1.2.3 m", ". m", "five m"] {
        assert!(
            matches!(parse_precision(line), Err(FormatError::InvalidPrecision { .. })),
            "expected invalid precision for {:?}",
            line
        );
    }
}

#[test]
fn test_timestamp_utc() {
    let ts = parse_timestamp("2025-07-29 14:23:45", TimestampZone::Utc).unwrap();
    assert_eq!(ts, Utc.with_ymd_and_hms(2025, 7, 29, 14, 23, 45).unwrap());
}

#[test]
fn test_timestamp_local_round_trips_through_local_zone() {
    let ts = parse_timestamp("2025-01-15 08:00:00", TimestampZone::Local).unwrap();
    let expected = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    assert_eq!(ts.with_timezone(&Local).naive_local(), expected);
}

#[test]
fn test_invalid_timestamp() {
    for line in [
        "2025-07-29",
        "14:23:45",
        "2025-13-01 00:00:00",
        "2025-02-30 10:00:00",
        "2025/07/29 14:23:45",
        "yesterday",
        "",
    ] {
        assert!(
            matches!(
                parse_timestamp(line, TimestampZone::Utc),
                Err(FormatError::InvalidDate { .. })
            ),
            "expected invalid date for {:?}",
            line
        );
    }
}

#[test]
fn test_device_name() {
    assert_eq!(parse_device_name("  SensorA  ").unwrap(), "SensorA");
    assert_eq!(parse_device_name("Sensor A-1").unwrap(), "Sensor A-1");
    assert_eq!(
        parse_device_name(" \t ").unwrap_err(),
        FormatError::EmptyDeviceName
    );
}

#[test]
fn test_sensor_line() {
    let readings = parse_sensor_line(SENSOR_LINE).unwrap();
    assert_eq!(readings.temperature_c, 21.3);
    assert_eq!(readings.humidity_percent, 55.0);
    assert_eq!(readings.pressure_kpa, 101.2);
    assert_eq!(readings.gas_resistance_ohms, 1234.5);
}

#[test]
fn test_sensor_line_negative_and_spacing() {
    let line = "  Temp:-4.5 °C  Humidity: 90%   Pressure: 99.9kPa Gas: 0 Ohms ";
    let readings = parse_sensor_line(line).unwrap();
    assert_eq!(readings.temperature_c, -4.5);
    assert_eq!(readings.humidity_percent, 90.0);
    assert_eq!(readings.pressure_kpa, 99.9);
    assert_eq!(readings.gas_resistance_ohms, 0.0);
}

#[test]
fn test_sensor_line_with_log_prefix() {
    let line = format!("[I][bme680] {}", SENSOR_LINE);
    assert!(parse_sensor_line(&line).is_ok());
}

#[test]
fn test_invalid_sensor_line() {
    for line in [
        "Temp: 21.3C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms",
        "Temp: 21.3°C Humidity: 55.0% Pressure: 101.2 kPa",
        "Temp: abc°C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms",
        "Temp: 2-1°C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms",
        "",
    ] {
        assert!(
            matches!(
                parse_sensor_line(line),
                Err(FormatError::InvalidSensorLine { .. })
            ),
            "expected invalid sensor line for {:?}",
            line
        );
    }
}

#[test]
fn test_parse_finite() {
    assert_eq!(parse_finite(" 1.5 "), Some(1.5));
    assert_eq!(parse_finite("-0"), Some(0.0));
    assert_eq!(parse_finite("NaN"), None);
    assert_eq!(parse_finite("-inf"), None);
    assert_eq!(parse_finite(""), None);
}
