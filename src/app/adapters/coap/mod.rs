//! CoAP transport for report submission
//!
//! Reporting devices speak CoAP (RFC 7252) over UDP. Packets are encoded
//! and decoded by `coap-lite`, which also reassembles Block1 request bodies
//! (RFC 7959). This adapter owns the socket and turns requests into handler
//! calls and handler replies into responses.
//!
//! - [`server`] - UDP listener loop
//! - [`exchange_cache`] - Duplicate message detection
//! - [`client`] - One-shot client used by the `send` command

pub mod client;
pub mod exchange_cache;
pub mod server;

pub use client::send_request;
pub use exchange_cache::{Admission, ExchangeCache};
pub use server::{CoapServer, reply_status};

use crate::app::services::request_handler::RequestMethod;
use coap_lite::{MessageClass, RequestType};

/// Handler view of a CoAP request method
pub fn request_method(method: &RequestType) -> RequestMethod {
    match method {
        RequestType::Post => RequestMethod::Submit,
        RequestType::Get => RequestMethod::Other("GET"),
        RequestType::Put => RequestMethod::Other("PUT"),
        RequestType::Delete => RequestMethod::Other("DELETE"),
        _ => RequestMethod::Other("UNKNOWN"),
    }
}

/// Code in `c.dd` notation, e.g. `2.05`
pub fn code_string(code: MessageClass) -> String {
    let raw = u8::from(code);
    format!("{}.{:02}", raw >> 5, raw & 0x1F)
}

/// Minimal big-endian encoding of an unsigned option value
pub fn uint_option_value(value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}
