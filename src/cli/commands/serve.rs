//! Serve command: run the CoAP listener until shutdown

use super::shared::build_sink;
use crate::Result;
use crate::app::adapters::coap::CoapServer;
use crate::app::services::report_parser::ReportParser;
use crate::app::services::request_handler::ReportHandler;
use crate::cli::args::ServeArgs;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run_serve(args: ServeArgs, cancellation: CancellationToken) -> Result<()> {
    let config = args.to_config()?;

    info!(
        "Starting CoAP ingest {} (sink: {}, timestamps: {})",
        env!("CARGO_PKG_VERSION"),
        config.sink.kind,
        config.parsing.timestamp_zone
    );

    let sink = build_sink(&config.sink);
    let handler = ReportHandler::new(ReportParser::new(config.parsing.timestamp_zone), sink);
    let server = CoapServer::bind(
        config.server.socket_addr(),
        handler,
        config.server.max_body_bytes,
    )
    .await?;

    server.run(cancellation).await
}
