//! Run-level error types.
//!
//! Only errors that stop a run live here. Per-candidate failures are recorded
//! as [`OutcomeStatus`](crate::candidate::OutcomeStatus) values and never
//! surface as `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::search::SearchError;

/// Invalid caller input. Fatal, and detected before any work starts.
#[derive(Debug, Error)]
pub enum InputError {
    /// Topic was empty after trimming.
    #[error("topic must not be empty")]
    EmptyTopic,

    /// Topic has no characters that survive sanitization.
    #[error("topic {topic:?} contains no characters usable in a directory name")]
    UnusableTopic {
        /// The trimmed topic as given.
        topic: String,
    },

    /// Requested count was zero or negative.
    #[error("number of papers must be greater than 0, got {count}")]
    NonPositiveCount {
        /// The rejected count.
        count: i64,
    },
}

/// Errors that halt an acquisition run before a manifest is produced.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Caller input was rejected.
    #[error(transparent)]
    Input(#[from] InputError),

    /// Search failed after retries and no fallback dataset was configured.
    #[error("search unavailable: {0}")]
    SearchUnavailable(#[source] SearchError),

    /// The per-topic output directory could not be created.
    #[error("IO error preparing {path}: {source}")]
    Io {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl AcquisitionError {
    /// Creates an IO error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_display() {
        assert_eq!(InputError::EmptyTopic.to_string(), "topic must not be empty");
        let msg = InputError::NonPositiveCount { count: -2 }.to_string();
        assert!(msg.contains("-2"), "Expected count in: {msg}");
    }

    #[test]
    fn test_acquisition_error_wraps_input_transparently() {
        let error = AcquisitionError::from(InputError::EmptyTopic);
        assert_eq!(error.to_string(), "topic must not be empty");
    }

    #[test]
    fn test_acquisition_error_io_display_contains_path() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = AcquisitionError::io("/tmp/papers/ml", io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/papers/ml"), "Expected path in: {msg}");
    }

    #[test]
    fn test_search_unavailable_display_includes_cause() {
        let error = AcquisitionError::SearchUnavailable(SearchError::http_status(503));
        let msg = error.to_string();
        assert!(msg.starts_with("search unavailable"), "{msg}");
        assert!(msg.contains("503"), "{msg}");
    }
}
