//! Request handling for submitted reports
//!
//! The handler is transport-agnostic: the CoAP adapter hands it the request
//! method, the route and the fully reassembled body, and turns the returned
//! [`Reply`] into a CoAP response. Each request passes through
//! `AwaitingBody → Parsing → Persisting → Responded` and produces exactly
//! one reply.
//!
//! - [`handler`] - Dispatch, persistence and outcome mapping
//! - [`reply`] - Transport-neutral request method and reply types

pub mod handler;
pub mod reply;

#[cfg(test)]
pub mod tests;

pub use handler::ReportHandler;
pub use reply::{Reply, ReplyStatus, RequestMethod};
