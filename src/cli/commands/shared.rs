//! Shared components for CLI commands
//!
//! Logging setup, sink construction, and payload input used by more than
//! one command.

use crate::app::services::record_sink::{JsonLinesSink, MemorySink, RecordSink};
use crate::cli::args::LoggingArgs;
use crate::config::{SinkConfig, SinkKind};
use crate::{Error, Result};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path argument that selects standard input
pub const STDIN_PATH: &str = "-";

/// Set up structured logging on stderr
pub fn setup_logging(args: &LoggingArgs) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    // Create filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("coap_ingest={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| Error::configuration(format!("Failed to initialise logging: {}", e)))?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Construct the record sink selected by the configuration
pub fn build_sink(config: &SinkConfig) -> Arc<dyn RecordSink> {
    match config.kind {
        SinkKind::Jsonl => {
            info!("Appending records under {}", config.data_dir.display());
            Arc::new(JsonLinesSink::new(&config.data_dir))
        }
        SinkKind::Memory => {
            warn!("Using in-memory sink; records are discarded on exit");
            Arc::new(MemorySink::new())
        }
    }
}

/// Read a report payload from a file, or from stdin when the path is `-`
pub fn read_payload(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == STDIN_PATH {
        let mut payload = Vec::new();
        std::io::stdin()
            .read_to_end(&mut payload)
            .map_err(|e| Error::io("Failed to read payload from stdin", e))?;
        return Ok(payload);
    }

    std::fs::read(path)
        .map_err(|e| Error::io(format!("Failed to read payload from {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_read_payload_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.txt");
        std::fs::write(&path, b"line one\nline two").unwrap();

        assert_eq!(read_payload(&path).unwrap(), b"line one\nline two");
    }

    #[test]
    fn test_read_payload_missing_file() {
        let error = read_payload(&PathBuf::from("/nonexistent/report.txt")).unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
        assert!(error.to_string().contains("/nonexistent/report.txt"));
    }

    #[tokio::test]
    async fn test_build_memory_sink() {
        let config = SinkConfig {
            kind: SinkKind::Memory,
            ..SinkConfig::default()
        };
        let sink = build_sink(&config);
        sink.append("iot_data", serde_json::json!({"a": 1}))
            .await
            .unwrap();
    }
}
