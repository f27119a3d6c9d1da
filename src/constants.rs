//! Application constants for the CoAP ingest service
//!
//! This module contains protocol constants, default values, collection
//! names and response bodies used throughout the service.

// =============================================================================
// Network Defaults
// =============================================================================

/// Default CoAP port (RFC 7252 §6.1)
pub const DEFAULT_PORT: u16 = 5683;

/// Default address the listener binds to
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Environment variable carrying the listening port
pub const PORT_ENV_VAR: &str = "PORT";

/// Environment variable overriding the sink data directory
pub const DATA_DIR_ENV_VAR: &str = "COAP_INGEST_DATA_DIR";

/// Directory name used under the platform data directory
pub const APP_DIR_NAME: &str = "coap-ingest";

/// Largest request body accepted after Block1 reassembly
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Receive buffer for a single UDP datagram
pub const DATAGRAM_BUFFER_BYTES: usize = 64 * 1024;

// =============================================================================
// Routes and Collections
// =============================================================================

/// Uri-Path values that select the climate route
pub const CLIMATE_ROUTE_PATHS: &[&str] = &["clima", "climate"];

/// Collection that receives location reports
pub const LOCATION_COLLECTION: &str = "iot_data";

/// Collection that receives climate reports
pub const CLIMATE_COLLECTION: &str = "clima_data";

/// Line counts of the two report formats
pub mod report_lines {
    /// Location report: coordinates, precision, timestamp, device name
    pub const LOCATION: usize = 4;

    /// Climate report: the location lines plus one sensor log line
    pub const CLIMATE: usize = 5;
}

/// Naive timestamp format carried on the third report line
pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Response Bodies
// =============================================================================

pub mod responses {
    /// Location record stored
    pub const LOCATION_SAVED: &str = "Data saved";

    /// Climate record stored
    pub const CLIMATE_SAVED: &str = "Climate data saved";

    /// Prefix of every client-error body
    pub const INVALID_FORMAT_PREFIX: &str = "Invalid format: ";

    /// Sink rejected the record
    pub const SAVE_FAILED: &str = "Error saving record";

    /// Anything other than POST
    pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";

    /// Request body exceeded the configured limit
    pub const BODY_TOO_LARGE: &str = "Request body too large";
}

// =============================================================================
// CoAP Transmission Parameters (RFC 7252 §4.8)
// =============================================================================

pub mod transmission {
    use std::time::Duration;

    /// Initial retransmission timeout for confirmable messages
    pub const ACK_TIMEOUT: Duration = Duration::from_secs(2);

    /// Retransmissions before a confirmable exchange is abandoned
    pub const MAX_RETRANSMIT: u32 = 4;

    /// Lifetime of a partially received Block1 body
    pub const BLOCK1_ASSEMBLY_LIFETIME: Duration = Duration::from_secs(60);

    /// How long a received message id is remembered for deduplication
    pub const EXCHANGE_LIFETIME: Duration = Duration::from_secs(247);

    /// Most message ids remembered at once
    pub const EXCHANGE_CACHE_CAPACITY: usize = 4096;

    /// Default overall timeout for the `send` command
    pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
}
