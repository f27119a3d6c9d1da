//! Configuration management and validation.
//!
//! Provides the configuration structures for the listener, the record sink
//! and report parsing. Values come from command-line flags and environment
//! variables; everything has a working default so the service can start
//! with no configuration at all.

use crate::constants::{APP_DIR_NAME, DEFAULT_BIND_ADDRESS, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub sink: SinkConfig,
    pub parsing: ParsingConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the UDP socket binds to
    pub bind_address: IpAddr,

    /// UDP port (0 picks an ephemeral port)
    pub port: u16,

    /// Largest request body accepted after Block1 reassembly
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS
                .parse()
                .unwrap_or(IpAddr::from([0, 0, 0, 0])),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

/// Which record sink implementation to run with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Append-only JSON-lines files, one per collection
    #[default]
    Jsonl,
    /// Keep records in memory only (dry runs)
    Memory,
}

impl FromStr for SinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jsonl" | "file" => Ok(SinkKind::Jsonl),
            "memory" | "mem" => Ok(SinkKind::Memory),
            other => Err(Error::configuration(format!(
                "Unknown sink '{}' (expected 'jsonl' or 'memory')",
                other
            ))),
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Jsonl => write!(f, "jsonl"),
            SinkKind::Memory => write!(f, "memory"),
        }
    }
}

/// Record sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,

    /// Directory holding `<collection>.jsonl` files
    pub data_dir: PathBuf,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            data_dir: default_data_dir(),
        }
    }
}

/// Zone in which the naive report timestamp is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampZone {
    /// Treat report times as UTC
    #[default]
    Utc,
    /// Treat report times as host local time
    Local,
}

impl FromStr for TimestampZone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "utc" => Ok(TimestampZone::Utc),
            "local" => Ok(TimestampZone::Local),
            other => Err(Error::configuration(format!(
                "Unknown timestamp zone '{}' (expected 'utc' or 'local')",
                other
            ))),
        }
    }
}

impl fmt::Display for TimestampZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampZone::Utc => write!(f, "utc"),
            TimestampZone::Local => write!(f, "local"),
        }
    }
}

/// Report parsing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingConfig {
    pub timestamp_zone: TimestampZone,
}

impl Config {
    /// Check the configuration for values the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.max_body_bytes == 0 {
            return Err(Error::configuration(
                "max_body_bytes must be greater than zero",
            ));
        }

        if self.sink.kind == SinkKind::Jsonl && self.sink.data_dir.as_os_str().is_empty() {
            return Err(Error::configuration(
                "data_dir must be set when using the jsonl sink",
            ));
        }

        debug!(
            "Configuration validated: listen={}, sink={}, data_dir={}, zone={}",
            self.server.socket_addr(),
            self.sink.kind,
            self.sink.data_dir.display(),
            self.parsing.timestamp_zone
        );

        Ok(())
    }
}

/// Platform data directory for the JSON-lines sink
///
/// Falls back to a relative `data` directory when the platform has no
/// notion of a per-user data directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.server.port, 5683);
        assert_eq!(config.sink.kind, SinkKind::Jsonl);
        assert_eq!(config.parsing.timestamp_zone, TimestampZone::Utc);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_body_limit_rejected() {
        let mut config = Config::default();
        config.server.max_body_bytes = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_empty_data_dir_only_matters_for_file_sink() {
        let mut config = Config::default();
        config.sink.data_dir = PathBuf::new();
        assert!(config.validate().is_err());

        config.sink.kind = SinkKind::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ServerConfig::default();
        config.bind_address = "127.0.0.1".parse().unwrap();
        config.port = 6000;
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:6000");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("LOCAL".parse::<TimestampZone>().unwrap(), TimestampZone::Local);
        assert_eq!("memory".parse::<SinkKind>().unwrap(), SinkKind::Memory);
        assert!("tokyo".parse::<TimestampZone>().is_err());
        assert!("postgres".parse::<SinkKind>().is_err());
    }
}
