//! Per-topic JSON manifest of run outcomes.
//!
//! The manifest is a pretty-printed JSON array, one entry per recorded
//! outcome. It is written to a temporary file next to the target and
//! renamed into place so readers never see a half-written manifest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::candidate::{DownloadOutcome, OutcomeStatus};
use crate::config::ManifestMode;

/// Errors from reading or writing a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File system error.
    #[error("IO error on manifest {path}: {source}")]
    Io {
        /// Manifest (or temporary) path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("manifest JSON error for {path}: {source}")]
    Json {
        /// Manifest path.
        path: PathBuf,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

impl ManifestError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

/// One manifest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Paper title.
    pub title: String,
    /// Author names.
    pub authors: Vec<String>,
    /// Publication year.
    pub year: Option<i32>,
    /// Citation count at search time.
    pub citation_count: Option<u64>,
    /// Link the PDF was (or would have been) fetched from.
    pub pdf_url: Option<String>,
    /// Saved file, for successful outcomes.
    pub pdf_path: Option<PathBuf>,
    /// Terminal status.
    pub status: OutcomeStatus,
}

impl From<&DownloadOutcome> for ManifestEntry {
    fn from(outcome: &DownloadOutcome) -> Self {
        let candidate = &outcome.candidate;
        Self {
            title: candidate.title.clone(),
            authors: candidate.authors.clone(),
            year: candidate.year,
            citation_count: candidate.citation_count,
            pdf_url: candidate.pdf_url.clone(),
            pdf_path: outcome.file_path.clone(),
            status: outcome.status,
        }
    }
}

/// Builds manifest entries from outcomes, keeping their order.
#[must_use]
pub fn entries_for(outcomes: &[DownloadOutcome], mode: ManifestMode) -> Vec<ManifestEntry> {
    outcomes
        .iter()
        .filter(|o| mode == ManifestMode::All || o.status.is_success())
        .map(ManifestEntry::from)
        .collect()
}

/// Reads and writes manifests on the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataStore;

impl MetadataStore {
    /// Writes `entries` to `path`, replacing any previous manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if encoding, writing or renaming fails. The
    /// temporary file is removed on failure.
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn write(&self, entries: &[ManifestEntry], path: &Path) -> Result<(), ManifestError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| ManifestError::json(path, e))?;

        let temp_path = path.with_extension("json.tmp");
        if let Err(e) = tokio::fs::write(&temp_path, &json).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ManifestError::io(&temp_path, e));
        }
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(ManifestError::io(path, e));
        }

        debug!("manifest written");
        Ok(())
    }

    /// Reads a manifest previously written by [`Self::write`].
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the file is missing or not a manifest.
    pub async fn read(&self, path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| ManifestError::io(path, e))?;
        serde_json::from_slice(&raw).map_err(|e| ManifestError::json(path, e))
    }
}
