//! paperfetch core library
//!
//! Turns a research topic into a directory of validated open-access PDFs
//! plus a JSON manifest.
//!
//! # Architecture
//!
//! - [`search`] - paper search with bounded retry and an offline fallback
//! - [`rank`] - PDF-link eligibility, de-duplication and citation ordering
//! - [`fetch`] - streaming PDF download with content validation
//! - [`orchestrator`] - one end-to-end run with a bounded worker pool
//! - [`manifest`] - per-topic JSON manifest
//! - [`config`] - named configuration and TOML loading
//! - [`sanitize`] - filesystem-safe names

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod orchestrator;
pub mod rank;
pub mod retry;
pub mod sanitize;
pub mod search;
pub mod user_agent;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use candidate::{AcquisitionTarget, DownloadOutcome, OutcomeStatus, PaperCandidate};
pub use config::{AcquisitionConfig, ConfigError, ManifestMode};
pub use error::{AcquisitionError, InputError};
pub use fetch::{FetchError, FetchStatus, PdfFetch, PdfFetcher};
pub use manifest::{ManifestEntry, ManifestError, MetadataStore};
pub use orchestrator::{AcquisitionOrchestrator, RunReport};
pub use rank::{partition_candidates, select_top_candidates};
pub use retry::{RetryPolicy, Sleeper};
pub use sanitize::sanitize;
pub use search::{BundledFallback, FallbackDataset, PaperSearch, SearchClient, SearchError};
