//! Error types for the search phase.

use std::time::Duration;

use thiserror::Error;

use crate::retry::{FailureType, classify_http_status, parse_retry_after};

/// Errors from a paper search request.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Network-level error (DNS, connection refused, TLS, reset).
    #[error("network error contacting paper search: {source}")]
    Network {
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before a response arrived.
    #[error("paper search timed out")]
    Timeout,

    /// Non-2xx response.
    #[error("paper search returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// Response body was not the expected JSON shape.
    #[error("malformed paper search response: {reason}")]
    MalformedResponse {
        /// Parser message.
        reason: String,
    },

    /// The configured endpoint is not a usable URL.
    #[error("invalid search endpoint: {endpoint}")]
    InvalidEndpoint {
        /// The rejected endpoint.
        endpoint: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build search HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl SearchError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn network(source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout
        } else {
            Self::Network { source }
        }
    }

    /// Creates an HTTP status error.
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus {
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    #[must_use]
    pub fn http_status_with_retry_after(status: u16, retry_after: Option<String>) -> Self {
        Self::HttpStatus {
            status,
            retry_after,
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(reason: impl ToString) -> Self {
        Self::MalformedResponse {
            reason: reason.to_string(),
        }
    }

    /// Creates an invalid-endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
        }
    }

    /// Retry classification of this error.
    #[must_use]
    pub fn failure_type(&self) -> FailureType {
        match self {
            Self::Network { .. } | Self::Timeout => FailureType::Transient,
            Self::HttpStatus { status, .. } => classify_http_status(*status),
            Self::MalformedResponse { .. }
            | Self::InvalidEndpoint { .. }
            | Self::ClientBuild { .. } => FailureType::Permanent,
        }
    }

    /// Server-requested delay, when the response carried a parseable Retry-After.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::HttpStatus {
                retry_after: Some(value),
                ..
            } => parse_retry_after(value),
            _ => None,
        }
    }
}
