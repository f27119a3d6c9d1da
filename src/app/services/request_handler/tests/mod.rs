//! Tests for the report handler
//!
//! The handler runs against [`MemorySink`] so persistence outcomes can be
//! observed and failures injected without touching the disk.


use crate::app::services::record_sink::MemorySink;
use crate::app::services::report_parser::ReportParser;
use crate::app::services::request_handler::ReportHandler;
use std::sync::Arc;

pub const LOCATION_BODY: &str = "-33.45,-70.66\n5.0 m\n2025-07-29 14:23:45\nSensorA";

pub const CLIMATE_BODY: &str = "-33.45,-70.66\n5.0 m\n2025-07-29 14:23:45\nSensorA\nTemp: 21.3°C Humidity: 55.0% Pressure: 101.2 kPa Gas: 1234.5 Ohms";

/// Handler wired to a fresh recording sink
pub fn create_test_handler() -> (ReportHandler, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let handler = ReportHandler::new(ReportParser::default(), sink.clone());
    (handler, sink)
}
