//! Transport-neutral request and reply types

use crate::app::services::report_parser::FormatError;
use crate::constants::responses;
use std::fmt;

/// Method of an inbound request as far as the handler cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    /// The single accepted method (CoAP POST)
    Submit,
    /// Any other method; carries the transport's name for logging
    Other(&'static str),
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestMethod::Submit => write!(f, "POST"),
            RequestMethod::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Outcome class of a handled request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// Record stored
    Success,
    /// Payload failed validation
    BadRequest,
    /// Method other than submit
    MethodNotAllowed,
    /// Sink failed to store the record
    ServerError,
}

/// Status and plain-text body returned to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: ReplyStatus,
    pub body: String,
}

impl Reply {
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Success,
            body: body.into(),
        }
    }

    /// Client error carrying the validation failure
    pub fn invalid_format(error: &FormatError) -> Self {
        Self {
            status: ReplyStatus::BadRequest,
            body: format!("{}{}", responses::INVALID_FORMAT_PREFIX, error),
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: ReplyStatus::MethodNotAllowed,
            body: responses::METHOD_NOT_ALLOWED.to_string(),
        }
    }

    /// Generic server error; the underlying cause is never included
    pub fn save_failed() -> Self {
        Self {
            status: ReplyStatus::ServerError,
            body: responses::SAVE_FAILED.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }
}
