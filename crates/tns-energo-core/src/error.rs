//! Error types for the TNS Energo client
//!
//! Every failure surfaced by the crate is one variant of [`Error`]. The variants
//! fall into four groups (transport, response, mapping and caller arguments),
//! each with a predicate so callers can branch on the category without
//! matching every variant.

use reqwest::Method;
use std::time::Duration;
use thiserror::Error;

/// Main error type for TNS Energo operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure: connection, DNS, malformed request
    #[error("{method} request to {url} failed: {message}")]
    Request {
        method: Method,
        url: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The request did not complete within the session timeout
    #[error("{method} request to {url} timed out after {timeout:?}")]
    RequestTimeout {
        method: Method,
        url: String,
        timeout: Duration,
    },

    /// The vendor envelope reported `result = false`
    #[error("Response error [{code}]: {message}")]
    Response { code: String, message: String },

    /// Non-2xx status or a body that is not valid JSON
    #[error("Invalid response{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    InvalidResponse {
        status: Option<u16>,
        message: String,
    },

    /// The vendor returned no body where content was expected
    #[error("Response result is empty for action '{action}'")]
    EmptyResult { action: &'static str },

    /// A raw value could not be converted into the expected type
    #[error("Format error: {message}")]
    Format { message: String },

    /// A record field without default is absent from the raw mapping
    #[error("Missing field '{field}' for {record}")]
    MissingField { record: &'static str, field: String },

    /// Caller-supplied arguments violate a precondition
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A submitted reading does not exceed the last known one
    #[error("Invalid indication for zone {zone}: {value} does not exceed previous value {last}")]
    InvalidIndication { zone: String, value: i64, last: i64 },

    /// Session configuration errors (unknown region, bad timeout)
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Transport failures, including timeouts
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::Request { .. } | Self::RequestTimeout { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::RequestTimeout { .. })
    }

    /// Envelope rejections, malformed bodies and empty results
    pub fn is_response_error(&self) -> bool {
        matches!(
            self,
            Self::Response { .. } | Self::InvalidResponse { .. } | Self::EmptyResult { .. }
        )
    }

    /// Failures raised while converting raw payloads into records
    pub fn is_mapping_error(&self) -> bool {
        matches!(self, Self::Format { .. } | Self::MissingField { .. })
    }

    /// Precondition violations of caller-supplied arguments
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::InvalidIndication { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidResponse {
            status: None,
            message: format!("could not decode response data: {err}"),
        }
    }
}
