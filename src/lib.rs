//! CoAP Ingest Library
//!
//! A Rust library for receiving small text-encoded sensor reports over CoAP
//! and appending the parsed records to a document store.
//!
//! This library provides tools for:
//! - Parsing the four-line location report and five-line climate report formats
//! - Dispatching requests by route and mapping outcomes to CoAP response codes
//! - Appending records to named collections through a narrow sink interface
//! - Encoding and decoding CoAP messages, including Block1 request bodies
//! - Running the UDP listener with graceful shutdown

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod record_sink;
        pub mod report_parser;
        pub mod request_handler;
    }
    pub mod adapters {
        pub mod coap;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{ClimateReadings, ClimateRecord, LocationRecord, Report, Route};
pub use app::services::record_sink::{RecordSink, SinkError};
pub use app::services::report_parser::FormatError;
pub use config::Config;

/// Result type alias for the CoAP ingest service
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for service operations outside the per-request path
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Report payload was rejected by the parser
    #[error("Report format error: {0}")]
    Format(#[from] FormatError),

    /// Record could not be persisted
    #[error("Record sink error: {0}")]
    Sink(#[from] SinkError),

    /// CoAP message could not be encoded or decoded
    #[error("CoAP codec error: {0}")]
    Codec(#[from] coap_lite::error::MessageError),

    /// CoAP exchange did not complete
    #[error("CoAP exchange failed: {message}")]
    Exchange { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a CoAP exchange error
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::Exchange {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}
