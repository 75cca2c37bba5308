//! Core records that flow through an acquisition run.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::InputError;
use crate::sanitize::{directory_name_for_topic, sanitize};

/// A paper record returned by search, before eligibility filtering.
///
/// Candidates have no persistent identity; they only belong to the topic of
/// the run that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperCandidate {
    /// Paper title (a placeholder when the API omitted it).
    pub title: String,
    /// Author names in publication order.
    pub authors: Vec<String>,
    /// Publication year, when known.
    pub year: Option<i32>,
    /// Citation count used as a ranking signal, when known.
    pub citation_count: Option<u64>,
    /// Direct open-access PDF link.
    pub pdf_url: Option<String>,
    /// Landing page for the paper (abstract page, publisher page).
    pub source_page_url: Option<String>,
}

impl PaperCandidate {
    /// Creates a candidate with only a title set.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            year: None,
            citation_count: None,
            pdf_url: None,
            source_page_url: None,
        }
    }

    /// Sets the author list.
    #[must_use]
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the publication year.
    #[must_use]
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Sets the citation count.
    #[must_use]
    pub fn with_citation_count(mut self, citation_count: u64) -> Self {
        self.citation_count = Some(citation_count);
        self
    }

    /// Sets the direct PDF link.
    #[must_use]
    pub fn with_pdf_url(mut self, pdf_url: impl Into<String>) -> Self {
        self.pdf_url = Some(pdf_url.into());
        self
    }

    /// Sets the landing page link.
    #[must_use]
    pub fn with_source_page_url(mut self, url: impl Into<String>) -> Self {
        self.source_page_url = Some(url.into());
        self
    }
}

/// What the caller asked for: a topic and how many PDFs to acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionTarget {
    topic: String,
    requested_count: usize,
}

impl AcquisitionTarget {
    /// Validates caller input into a target.
    ///
    /// The topic is trimmed and must be non-empty both as given and after
    /// sanitization (it names the output directory). A count above
    /// `max_limit` is clamped with a warning rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] for an empty or unusable topic, or a count
    /// that is zero or negative.
    pub fn new(topic: &str, requested_count: i64, max_limit: usize) -> Result<Self, InputError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(InputError::EmptyTopic);
        }
        if sanitize(topic).is_empty() {
            return Err(InputError::UnusableTopic {
                topic: topic.to_string(),
            });
        }
        if requested_count <= 0 {
            return Err(InputError::NonPositiveCount {
                count: requested_count,
            });
        }

        let max_limit = max_limit.max(1);
        let requested = usize::try_from(requested_count).unwrap_or(usize::MAX);
        let requested_count = if requested > max_limit {
            warn!(
                requested,
                max_limit, "requested count exceeds limit, clamping"
            );
            max_limit
        } else {
            requested
        };

        Ok(Self {
            topic: topic.to_string(),
            requested_count,
        })
    }

    /// The trimmed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of PDFs to acquire after clamping.
    #[must_use]
    pub fn requested_count(&self) -> usize {
        self.requested_count
    }

    /// Directory name for this topic, sanitized and length-capped.
    #[must_use]
    pub fn directory_name(&self) -> String {
        directory_name_for_topic(&self.topic)
    }
}

/// Terminal status of one candidate in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Downloaded and validated in this run.
    Success,
    /// No usable PDF link could be found or derived.
    NoPdfAvailable,
    /// Network or HTTP failure.
    DownloadFailed,
    /// Transfer succeeded but the body was not a valid PDF.
    InvalidContent,
    /// A valid file from an earlier run was reused.
    AlreadyExists,
}

impl OutcomeStatus {
    /// Whether this status contributes to the success count.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::AlreadyExists)
    }

    /// Stable label used in logs and the manifest.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoPdfAvailable => "no_pdf_available",
            Self::DownloadFailed => "download_failed",
            Self::InvalidContent => "invalid_content",
            Self::AlreadyExists => "already_exists",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    /// The candidate as ranked (with any derived PDF link).
    pub candidate: PaperCandidate,
    /// Destination file; set for successful outcomes.
    pub file_path: Option<PathBuf>,
    /// Terminal status.
    pub status: OutcomeStatus,
}

impl DownloadOutcome {
    /// Builds an outcome, keeping the file path only for successful statuses.
    #[must_use]
    pub fn new(candidate: PaperCandidate, file_path: Option<PathBuf>, status: OutcomeStatus) -> Self {
        let file_path = file_path.filter(|_| status.is_success());
        Self {
            candidate,
            file_path,
            status,
        }
    }
}
