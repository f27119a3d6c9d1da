//! Test fixtures for report parser testing
//!
//! This module provides sample payloads shared by the field-level and
//! report-level test modules.

// Test modules
mod field_parser_tests;

/// Sensor log line matching the reference climate sample
pub const SENSOR_LINE: &str = "Temp: 21.3°C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms";

/// Reference four-line location report
pub fn location_payload() -> String {
    "-33.45,-70.66\n5.0 m\n2025-07-29 14:23:45\nSensorA".to_string()
}

/// Reference five-line climate report
pub fn climate_payload() -> String {
    format!("{}\n{}", location_payload(), SENSOR_LINE)
}

/// Location report with one line replaced
pub fn location_payload_with(line_index: usize, replacement: &str) -> String {
    let mut lines: Vec<String> = location_payload().lines().map(str::to_string).collect();
    lines[line_index] = replacement.to_string();
    lines.join("\n")
}
