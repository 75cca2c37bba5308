//! Error types for PDF downloads.
//!
//! These never leave the fetch module as `Err`; [`PdfFetcher`](super::PdfFetcher)
//! logs them and reports a [`FetchStatus`](super::FetchStatus).

use std::path::PathBuf;

use thiserror::Error;

use super::validate::PdfValidity;

/// Errors that can occur while downloading one PDF.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The URL is malformed or not http(s).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// Network-level error (DNS, connection refused, TLS, reset mid-body).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-2xx response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while writing or validating.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Body was received but is not an acceptable PDF.
    #[error("invalid PDF content from {url}: {validity}")]
    InvalidContent {
        /// The URL that served the body.
        url: String,
        /// Why validation rejected it.
        validity: PdfValidity,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build download HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a network or timeout error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid content error.
    pub fn invalid_content(url: impl Into<String>, validity: PdfValidity) -> Self {
        Self::InvalidContent {
            url: url.into(),
            validity,
        }
    }
}
