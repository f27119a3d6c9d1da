//! Report handler: parse by route, append to the sink, map the outcome

use super::reply::{Reply, RequestMethod};
use crate::app::models::{Report, Route};
use crate::app::services::record_sink::RecordSink;
use crate::app::services::report_parser::{FormatError, ReportParser};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared per-process handler; cheap to clone into request tasks
#[derive(Clone)]
pub struct ReportHandler {
    parser: ReportParser,
    sink: Arc<dyn RecordSink>,
}

impl ReportHandler {
    pub fn new(parser: ReportParser, sink: Arc<dyn RecordSink>) -> Self {
        Self { parser, sink }
    }

    /// Handle one request and produce its single reply
    ///
    /// Non-submit methods are refused before the body is looked at.
    pub async fn handle(&self, method: RequestMethod, route: Route, body: &[u8]) -> Reply {
        if method != RequestMethod::Submit {
            debug!("Rejecting {} request on {} route", method, route);
            return Reply::method_not_allowed();
        }

        debug!(
            "Received {} report payload ({} bytes):\n{}",
            route,
            body.len(),
            String::from_utf8_lossy(body)
        );

        let report = match self.parse_guarded(route, body) {
            Ok(report) => report,
            Err(format_error) => {
                warn!("Rejected {} report: {}", route, format_error);
                return Reply::invalid_format(&format_error);
            }
        };

        let document = match report.to_document() {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to serialize {} report: {}", route, e);
                return Reply::save_failed();
            }
        };

        match self.sink.append(route.collection(), document).await {
            Ok(()) => {
                info!(
                    "Stored {} report from '{}' in '{}'",
                    route,
                    report.device_name(),
                    route.collection()
                );
                Reply::success(route.saved_message())
            }
            Err(sink_error) => {
                error!("Sink error storing {} report: {}", route, sink_error);
                Reply::save_failed()
            }
        }
    }

    fn parse_guarded(&self, route: Route, body: &[u8]) -> Result<Report, FormatError> {
        let parser = self.parser;
        guard_parse(|| parser.parse(route, body))
    }
}

/// Run a parse, turning a panic inside it into a format error
pub(crate) fn guard_parse<F>(parse: F) -> Result<Report, FormatError>
where
    F: FnOnce() -> Result<Report, FormatError>,
{
    panic::catch_unwind(AssertUnwindSafe(parse)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "parser panicked".to_string());
        Err(FormatError::unexpected(message))
    })
}
