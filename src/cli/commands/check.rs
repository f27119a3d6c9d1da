//! Check command: parse a payload without a network or a sink
//!
//! Prints the document that would be stored, or the reason the listener
//! would answer `4.00`.

use super::shared::read_payload;
use crate::app::models::Report;
use crate::app::services::report_parser::{FormatError, ReportParser};
use crate::cli::args::CheckArgs;
use crate::constants::responses;
use crate::{Error, Result};
use colored::*;

pub fn run_check(args: CheckArgs) -> Result<()> {
    let payload = read_payload(&args.input)?;
    let parser = ReportParser::new(args.timestamp_zone);

    match parser.parse(args.route, &payload) {
        Ok(report) => {
            println!("{}", render_document(&report)?);
            eprintln!(
                "{} {} report from {} ({})",
                "Valid".bright_green().bold(),
                args.route,
                report.device_name().bright_white().bold(),
                args.route.collection()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{} {}{}",
                "Rejected".bright_red().bold(),
                responses::INVALID_FORMAT_PREFIX,
                e
            );
            Err(Error::Format(e))
        }
    }
}

/// Pretty-printed document as the sink would receive it
fn render_document(report: &Report) -> Result<String> {
    report
        .to_document()
        .and_then(|document| serde_json::to_string_pretty(&document))
        .map_err(|e| Error::Format(FormatError::unexpected(e.to_string())))
}
