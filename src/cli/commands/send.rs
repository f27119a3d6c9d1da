//! Send command: post a report payload to a running listener

use super::shared::read_payload;
use crate::app::adapters::coap::{code_string, send_request};
use crate::cli::args::SendArgs;
use crate::{Error, Result};
use coap_lite::MessageClass;
use colored::*;
use std::net::SocketAddr;
use tracing::debug;

pub async fn run_send(args: SendArgs) -> Result<()> {
    let payload = read_payload(&args.input)?;
    let target = resolve_target(&args.target).await?;
    let method = args.request_method();
    let path = args.route.uri_path();

    debug!(
        "Sending {} bytes as {:?} {} to {}",
        payload.len(),
        method,
        path,
        target
    );

    let response = send_request(target, method, path, &payload, args.timeout()).await?;
    let code = response.header.code;
    let success = is_success(code);
    let status = if success {
        code_string(code).bright_green().bold()
    } else {
        code_string(code).bright_red().bold()
    };
    println!("{} {}", status, String::from_utf8_lossy(&response.payload));

    if success {
        Ok(())
    } else {
        Err(Error::exchange(format!(
            "{} answered {}",
            target,
            code_string(code)
        )))
    }
}

/// 2.xx response codes
fn is_success(code: MessageClass) -> bool {
    matches!(code, MessageClass::Response(_)) && u8::from(code) >> 5 == 2
}

/// Resolve `host:port` to the first address returned
async fn resolve_target(target: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(target)
        .await
        .map_err(|e| Error::io(format!("Failed to resolve {}", target), e))?
        .next()
        .ok_or_else(|| Error::exchange(format!("{} did not resolve to any address", target)))
}
