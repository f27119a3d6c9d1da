//! Command-line argument definitions for the CoAP ingest service
//!
//! This module defines the CLI interface using the clap derive API. The
//! listener is the default command; `check` and `send` are tools for
//! working with report payloads by hand.

use crate::app::models::Route;
use crate::config::{Config, ParsingConfig, ServerConfig, SinkConfig, SinkKind, TimestampZone};
use crate::constants::{
    DATA_DIR_ENV_VAR, DEFAULT_BIND_ADDRESS, DEFAULT_MAX_BODY_BYTES, DEFAULT_PORT, PORT_ENV_VAR,
    transmission,
};
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use coap_lite::RequestType;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments for the CoAP ingest service
///
/// Listens for CoAP reports from field devices, validates the line-based
/// location and climate formats, and appends the records to a store.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "coap-ingest",
    version,
    about = "Receive sensor reports over CoAP and store them",
    long_about = "A small CoAP listener for field devices. Location reports (POST /) and \
                  climate reports (POST /clima) are parsed from their line-based text format \
                  and appended to per-collection JSON-lines files."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub logging: LoggingArgs,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run the CoAP listener (default command)
    Serve(ServeArgs),
    /// Parse a report payload offline and print the record
    Check(CheckArgs),
    /// Post a report payload to a running listener
    Send(SendArgs),
}

/// Logging flags shared by every command
#[derive(Debug, Clone, Default, ClapArgs)]
pub struct LoggingArgs {
    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl LoggingArgs {
    /// Get the log level string for the tracing filter
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

/// Arguments for the serve command
#[derive(Debug, Clone, Parser)]
pub struct ServeArgs {
    /// UDP port to listen on
    #[arg(
        short = 'p',
        long = "port",
        env = PORT_ENV_VAR,
        default_value_t = DEFAULT_PORT,
        help = "UDP port to listen on"
    )]
    pub port: u16,

    /// Address to bind
    #[arg(
        long = "bind",
        value_name = "ADDR",
        default_value = DEFAULT_BIND_ADDRESS,
        help = "Address the listener binds to"
    )]
    pub bind: IpAddr,

    /// Record sink implementation
    #[arg(
        long = "sink",
        value_name = "KIND",
        default_value_t = SinkKind::Jsonl,
        help = "Record sink: jsonl (files) or memory (dry run)"
    )]
    pub sink: SinkKind,

    /// Directory for the JSON-lines sink
    ///
    /// Defaults to the platform data directory, e.g. ~/.local/share/coap-ingest
    #[arg(
        short = 'd',
        long = "data-dir",
        value_name = "PATH",
        env = DATA_DIR_ENV_VAR,
        help = "Directory holding <collection>.jsonl files"
    )]
    pub data_dir: Option<PathBuf>,

    /// Largest accepted request body
    #[arg(
        long = "max-body-bytes",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_BODY_BYTES,
        help = "Largest request body accepted after block-wise reassembly"
    )]
    pub max_body_bytes: usize,

    /// Zone report timestamps are interpreted in
    #[arg(
        long = "timestamp-zone",
        value_name = "ZONE",
        default_value_t = TimestampZone::Utc,
        help = "Interpret report timestamps as utc or local time"
    )]
    pub timestamp_zone: TimestampZone,
}

impl ServeArgs {
    /// Serve arguments when no subcommand was given
    ///
    /// Parses an empty command line so environment variables still apply.
    pub fn from_env() -> Result<Self> {
        Self::try_parse_from(["serve"])
            .map_err(|e| Error::configuration(format!("Invalid environment: {}", e)))
    }

    /// Build the validated service configuration
    pub fn to_config(&self) -> Result<Config> {
        let mut sink = SinkConfig {
            kind: self.sink,
            ..SinkConfig::default()
        };
        if let Some(data_dir) = &self.data_dir {
            sink.data_dir = data_dir.clone();
        }

        let config = Config {
            server: ServerConfig {
                bind_address: self.bind,
                port: self.port,
                max_body_bytes: self.max_body_bytes,
            },
            sink,
            parsing: ParsingConfig {
                timestamp_zone: self.timestamp_zone,
            },
        };

        config.validate()?;
        Ok(config)
    }
}

/// Arguments for the check command
#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Payload file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Report format to parse
    #[arg(
        short = 'r',
        long = "route",
        default_value_t = Route::Location,
        help = "Report format: location or climate"
    )]
    pub route: Route,

    /// Zone report timestamps are interpreted in
    #[arg(long = "timestamp-zone", value_name = "ZONE", default_value_t = TimestampZone::Utc)]
    pub timestamp_zone: TimestampZone,
}

/// Arguments for the send command
#[derive(Debug, Clone, Parser)]
pub struct SendArgs {
    /// Payload file, or `-` for stdin
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Listener to send to
    #[arg(
        short = 't',
        long = "target",
        value_name = "HOST:PORT",
        default_value = "127.0.0.1:5683"
    )]
    pub target: String,

    /// Report route to post to
    #[arg(short = 'r', long = "route", default_value_t = Route::Location)]
    pub route: Route,

    /// Request method
    #[arg(
        long = "method",
        default_value = "post",
        value_parser = ["get", "post", "put", "delete"]
    )]
    pub method: String,

    /// Overall timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", default_value_t = transmission::DEFAULT_CLIENT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl SendArgs {
    pub fn request_method(&self) -> RequestType {
        match self.method.as_str() {
            "get" => RequestType::Get,
            "put" => RequestType::Put,
            "delete" => RequestType::Delete,
            _ => RequestType::Post,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
