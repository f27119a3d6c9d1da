//! Data models for sensor reports
//!
//! This module contains the record structures produced by the report parser
//! and the route type that selects which report format a request carries.
//! Records are immutable once constructed and are only ever built by the
//! parser after every field has been validated.

use crate::constants::{
    CLIMATE_COLLECTION, CLIMATE_ROUTE_PATHS, LOCATION_COLLECTION, report_lines, responses,
};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Routes
// =============================================================================

/// Logical endpoint a report was submitted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Four-line location report (default route)
    #[default]
    Location,
    /// Five-line location plus climate report
    Climate,
}

impl Route {
    /// Resolve the route from Uri-Path segments
    ///
    /// Only a single `clima` (or `climate`) segment selects the climate
    /// route; every other path, including the empty one, is a location report.
    pub fn from_path_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        match segments {
            [single] if CLIMATE_ROUTE_PATHS.contains(&single.as_ref()) => Route::Climate,
            _ => Route::Location,
        }
    }

    /// Resolve the route from a `/`-separated path string
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        Self::from_path_segments(&segments)
    }

    /// Collection the route's records are appended to
    pub fn collection(&self) -> &'static str {
        match self {
            Route::Location => LOCATION_COLLECTION,
            Route::Climate => CLIMATE_COLLECTION,
        }
    }

    /// Exact number of lines the route's payload must contain
    pub fn expected_lines(&self) -> usize {
        match self {
            Route::Location => report_lines::LOCATION,
            Route::Climate => report_lines::CLIMATE,
        }
    }

    /// Confirmation body sent once the record is stored
    pub fn saved_message(&self) -> &'static str {
        match self {
            Route::Location => responses::LOCATION_SAVED,
            Route::Climate => responses::CLIMATE_SAVED,
        }
    }

    /// Uri-Path a client should target for this route
    pub fn uri_path(&self) -> &'static str {
        match self {
            Route::Location => "/",
            Route::Climate => "/clima",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Location => write!(f, "location"),
            Route::Climate => write!(f, "climate"),
        }
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "location" | "iot" => Ok(Route::Location),
            "climate" | "clima" => Ok(Route::Climate),
            other => Err(Error::configuration(format!(
                "Unknown route '{}' (expected 'location' or 'climate')",
                other
            ))),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// Location fix reported by a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Latitude in decimal degrees (not range checked)
    pub latitude: f64,

    /// Longitude in decimal degrees (not range checked)
    pub longitude: f64,

    /// Reported fix precision in meters
    pub precision_meters: f64,

    /// Report time normalized to UTC, stored with millisecond precision
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    /// Trimmed, non-empty device name
    pub device_name: String,

    /// Payload exactly as received
    pub raw: String,
}

impl LocationRecord {
    /// Timestamp rendered as ISO-8601 with millisecond precision and `Z` suffix
    pub fn timestamp_iso(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(timestamp))
}

/// Environmental readings extracted from the climate sensor log line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReadings {
    /// Air temperature in degrees Celsius
    pub temperature_c: f64,

    /// Relative humidity in percent
    pub humidity_percent: f64,

    /// Barometric pressure in kilopascals
    pub pressure_kpa: f64,

    /// Gas sensor resistance in ohms
    pub gas_resistance_ohms: f64,
}

/// Location fix together with a climate sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    #[serde(flatten)]
    pub location: LocationRecord,

    #[serde(flatten)]
    pub readings: ClimateReadings,
}

/// A fully validated report of either format
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Location(LocationRecord),
    Climate(ClimateRecord),
}

impl Report {
    /// Route whose format produced this report
    pub fn route(&self) -> Route {
        match self {
            Report::Location(_) => Route::Location,
            Report::Climate(_) => Route::Climate,
        }
    }

    /// Location fields shared by both formats
    pub fn location(&self) -> &LocationRecord {
        match self {
            Report::Location(record) => record,
            Report::Climate(record) => &record.location,
        }
    }

    /// Climate readings, if this is a climate report
    pub fn readings(&self) -> Option<&ClimateReadings> {
        match self {
            Report::Location(_) => None,
            Report::Climate(record) => Some(&record.readings),
        }
    }

    /// Device that sent the report
    pub fn device_name(&self) -> &str {
        &self.location().device_name
    }

    /// JSON document handed to the record sink
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_location() -> LocationRecord {
        LocationRecord {
            latitude: -33.45,
            longitude: -70.66,
            precision_meters: 5.0,
            timestamp: Utc.with_ymd_and_hms(2025, 7, 29, 14, 23, 45).unwrap(),
            device_name: "SensorA".to_string(),
            raw: "raw payload".to_string(),
        }
    }

    #[test]
    fn test_route_from_path() {
        assert_eq!(Route::from_path("/clima"), Route::Climate);
        assert_eq!(Route::from_path("clima"), Route::Climate);
        assert_eq!(Route::from_path("/climate/"), Route::Climate);
        assert_eq!(Route::from_path("/"), Route::Location);
        assert_eq!(Route::from_path(""), Route::Location);
        assert_eq!(Route::from_path("/location"), Route::Location);
        assert_eq!(Route::from_path("/clima/extra"), Route::Location);
    }

    #[test]
    fn test_route_properties() {
        assert_eq!(Route::Location.collection(), "iot_data");
        assert_eq!(Route::Climate.collection(), "clima_data");
        assert_eq!(Route::Location.expected_lines(), 4);
        assert_eq!(Route::Climate.expected_lines(), 5);
        assert_eq!(Route::Climate.saved_message(), "Climate data saved");
        assert_eq!(Route::from_path(Route::Climate.uri_path()), Route::Climate);
    }

    #[test]
    fn test_route_from_str() {
        assert_eq!("climate".parse::<Route>().unwrap(), Route::Climate);
        assert_eq!("Location".parse::<Route>().unwrap(), Route::Location);
        assert!("weather".parse::<Route>().is_err());
    }

    #[test]
    fn test_timestamp_iso_uses_millis_and_z_suffix() {
        assert_eq!(sample_location().timestamp_iso(), "2025-07-29T14:23:45.000Z");
    }

    #[test]
    fn test_climate_document_is_flat() {
        let report = Report::Climate(ClimateRecord {
            location: sample_location(),
            readings: ClimateReadings {
                temperature_c: 21.3,
                humidity_percent: 55.0,
                pressure_kpa: 101.2,
                gas_resistance_ohms: 1234.5,
            },
        });

        let document = report.to_document().unwrap();
        assert_eq!(document["device_name"], "SensorA");
        assert_eq!(document["temperature_c"], 21.3);
        assert_eq!(document["gas_resistance_ohms"], 1234.5);
        assert_eq!(document["timestamp"], "2025-07-29T14:23:45.000Z");
        assert!(document.get("location").is_none());
        assert_eq!(report.route(), Route::Climate);
    }

    #[test]
    fn test_location_document_fields() {
        let report = Report::Location(sample_location());
        let document = report.to_document().unwrap();

        assert_eq!(document["latitude"], -33.45);
        assert_eq!(document["precision_meters"], 5.0);
        assert_eq!(document["raw"], "raw payload");
        assert_eq!(document["timestamp"], "2025-07-29T14:23:45.000Z");
        assert!(report.readings().is_none());
    }
}
