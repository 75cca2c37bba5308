//! End-to-end acquisition run.
//!
//! The orchestrator searches, partitions the candidates, and feeds eligible
//! ones to a bounded pool of fetch tasks. A fetch is dispatched only while
//! `successes + in_flight < requested`, so the run never downloads more
//! papers than asked for. Outcomes are reported in ranked order, followed
//! by the candidates that had no usable link.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paperfetch_core::{AcquisitionConfig, AcquisitionOrchestrator, AcquisitionTarget};
//! use paperfetch_core::fetch::PdfFetcher;
//! use paperfetch_core::search::SearchClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AcquisitionConfig::default();
//! let search = Arc::new(SearchClient::from_config(&config)?);
//! let fetcher = Arc::new(PdfFetcher::from_config(&config)?);
//! let target = AcquisitionTarget::new("quantum computing", 3, config.max_limit)?;
//!
//! let orchestrator = AcquisitionOrchestrator::new(config, search, fetcher);
//! let report = orchestrator.run(&target).await?;
//! println!("saved {} papers in {}", report.success_count, report.topic_dir.display());
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::candidate::{AcquisitionTarget, DownloadOutcome, OutcomeStatus, PaperCandidate};
use crate::config::AcquisitionConfig;
use crate::error::AcquisitionError;
use crate::fetch::{FetchStatus, PdfFetch, PdfValidity, validate_pdf};
use crate::manifest::{ManifestError, MetadataStore, entries_for};
use crate::rank::partition_candidates;
use crate::sanitize::file_stem_for_title;
use crate::search::PaperSearch;

/// File extension of saved papers.
const PDF_EXTENSION: &str = "pdf";

/// Summary of one run.
#[derive(Debug)]
pub struct RunReport {
    /// The validated target.
    pub target: AcquisitionTarget,
    /// Number of `Success` plus `AlreadyExists` outcomes.
    pub success_count: usize,
    /// Every outcome: ranked eligible candidates first, then unavailable ones.
    pub outcomes: Vec<DownloadOutcome>,
    /// `<output_root>/<sanitized topic>`.
    pub topic_dir: PathBuf,
    /// Where the manifest was (or would have been) written.
    pub manifest_path: PathBuf,
    /// Set when the manifest could not be written; files on disk are kept.
    pub manifest_error: Option<ManifestError>,
}

impl RunReport {
    /// Whether the run produced as many papers as requested.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.success_count >= self.target.requested_count()
    }

    /// Number of outcomes with `status`.
    #[must_use]
    pub fn count_with_status(&self, status: OutcomeStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }
}

/// Coordinates search, ranking, downloads and the manifest for one topic.
pub struct AcquisitionOrchestrator {
    config: AcquisitionConfig,
    search: Arc<dyn PaperSearch>,
    fetcher: Arc<dyn PdfFetch>,
    store: MetadataStore,
}

impl std::fmt::Debug for AcquisitionOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquisitionOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// An eligible candidate with its claimed destination.
struct PlannedFetch {
    index: usize,
    candidate: PaperCandidate,
    destination: PathBuf,
}

impl AcquisitionOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    #[must_use]
    pub fn new(
        config: AcquisitionConfig,
        search: Arc<dyn PaperSearch>,
        fetcher: Arc<dyn PdfFetch>,
    ) -> Self {
        Self {
            config,
            search,
            fetcher,
            store: MetadataStore,
        }
    }

    /// Validates caller input into a target, clamping the count to the
    /// configured `max_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Input`] for an empty or unusable topic or
    /// a non-positive count.
    pub fn target_for(&self, topic: &str, count: i64) -> Result<AcquisitionTarget, AcquisitionError> {
        Ok(AcquisitionTarget::new(topic, count, self.config.max_limit)?)
    }

    /// Runs one acquisition.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::SearchUnavailable`] when search fails and
    /// no fallback is configured, and [`AcquisitionError::Io`] when the topic
    /// directory cannot be created. Per-paper failures are outcomes, not
    /// errors.
    #[instrument(skip(self, target), fields(topic = %target.topic(), requested = target.requested_count()))]
    pub async fn run(&self, target: &AcquisitionTarget) -> Result<RunReport, AcquisitionError> {
        let requested = target.requested_count();
        let search_limit = requested.saturating_mul(self.config.search_buffer_multiplier.max(1));

        let candidates = self
            .search
            .search(target.topic(), search_limit)
            .await
            .map_err(AcquisitionError::SearchUnavailable)?;
        debug!(candidates = candidates.len(), search_limit, "search complete");

        let mut ranked = partition_candidates(&candidates, self.config.order_by_citations);
        ranked.eligible.truncate(search_limit);
        ranked.unavailable.truncate(search_limit);
        info!(
            eligible = ranked.eligible.len(),
            unavailable = ranked.unavailable.len(),
            "candidates ranked"
        );

        let topic_dir = self.config.output_root.join(target.directory_name());
        tokio::fs::create_dir_all(&topic_dir)
            .await
            .map_err(|e| AcquisitionError::io(&topic_dir, e))?;

        let plans = plan_destinations(ranked.eligible, &topic_dir);
        let mut outcomes = self.download_all(plans, requested).await;
        outcomes.extend(
            ranked
                .unavailable
                .into_iter()
                .map(|c| DownloadOutcome::new(c, None, OutcomeStatus::NoPdfAvailable)),
        );

        let success_count = outcomes.iter().filter(|o| o.status.is_success()).count();

        let manifest_path = topic_dir.join(&self.config.manifest_file_name);
        let entries = entries_for(&outcomes, self.config.manifest_mode);
        let manifest_error = match self.store.write(&entries, &manifest_path).await {
            Ok(()) => None,
            Err(error) => {
                warn!(error = %error, "failed to write manifest");
                Some(error)
            }
        };

        info!(
            success_count,
            requested,
            outcomes = outcomes.len(),
            dir = %topic_dir.display(),
            "acquisition finished"
        );

        Ok(RunReport {
            target: target.clone(),
            success_count,
            outcomes,
            topic_dir,
            manifest_path,
            manifest_error,
        })
    }

    /// Processes planned fetches with bounded concurrency and the
    /// short-circuit rule; returns outcomes in plan order.
    async fn download_all(
        &self,
        plans: Vec<PlannedFetch>,
        requested: usize,
    ) -> Vec<DownloadOutcome> {
        let concurrency = self.config.concurrency.max(1);
        let mut results: Vec<Option<DownloadOutcome>> = Vec::new();
        results.resize_with(plans.len(), || None);

        let mut in_flight: HashMap<usize, (PaperCandidate, PathBuf)> = HashMap::new();
        let mut tasks: JoinSet<(usize, FetchStatus)> = JoinSet::new();
        let mut pending = plans.into_iter();
        let mut successes = 0_usize;

        loop {
            while successes + tasks.len() < requested && tasks.len() < concurrency {
                let Some(plan) = pending.next() else {
                    break;
                };
                let PlannedFetch {
                    index,
                    candidate,
                    destination,
                } = plan;

                if self.reuse_existing(&destination).await {
                    info!(title = %candidate.title, path = %destination.display(), "already downloaded");
                    successes += 1;
                    results[index] = Some(DownloadOutcome::new(
                        candidate,
                        Some(destination),
                        OutcomeStatus::AlreadyExists,
                    ));
                    continue;
                }

                let Some(url) = candidate.pdf_url.clone() else {
                    results[index] = Some(DownloadOutcome::new(
                        candidate,
                        None,
                        OutcomeStatus::NoPdfAvailable,
                    ));
                    continue;
                };

                debug!(title = %candidate.title, %url, "dispatching download");
                let fetcher = Arc::clone(&self.fetcher);
                let task_destination = destination.clone();
                tasks.spawn(async move {
                    let status = fetcher.fetch(&url, &task_destination).await;
                    (index, status)
                });
                in_flight.insert(index, (candidate, destination));
            }

            let Some(joined) = tasks.join_next().await else {
                break;
            };
            match joined {
                Ok((index, status)) => {
                    let Some((candidate, destination)) = in_flight.remove(&index) else {
                        continue;
                    };
                    let status = outcome_status(status);
                    if status.is_success() {
                        successes += 1;
                    }
                    results[index] = Some(DownloadOutcome::new(candidate, Some(destination), status));
                }
                Err(error) => {
                    warn!(error = %error, "download task did not complete");
                }
            }
        }

        // Tasks that panicked or were cancelled never reported back.
        for (index, (candidate, _)) in in_flight {
            results[index] = Some(DownloadOutcome::new(
                candidate,
                None,
                OutcomeStatus::DownloadFailed,
            ));
        }

        results.into_iter().flatten().collect()
    }

    /// True when a valid PDF already sits at `destination`. An invalid file
    /// there is removed so it can be fetched again.
    async fn reuse_existing(&self, destination: &Path) -> bool {
        match validate_pdf(destination, self.config.min_valid_size).await {
            Ok(PdfValidity::Valid) => true,
            Ok(validity) => {
                warn!(path = %destination.display(), %validity, "replacing invalid existing file");
                if let Err(error) = tokio::fs::remove_file(destination).await {
                    warn!(path = %destination.display(), error = %error, "could not remove invalid file");
                }
                false
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => false,
            Err(error) => {
                debug!(path = %destination.display(), error = %error, "could not inspect existing file");
                false
            }
        }
    }
}

fn outcome_status(status: FetchStatus) -> OutcomeStatus {
    match status {
        FetchStatus::Success => OutcomeStatus::Success,
        FetchStatus::DownloadFailed => OutcomeStatus::DownloadFailed,
        FetchStatus::InvalidContent => OutcomeStatus::InvalidContent,
    }
}

/// Assigns each candidate a destination unique within the run.
///
/// The first paper with a given stem gets `<stem>.pdf`; later ones get
/// `<stem>_2.pdf`, `<stem>_3.pdf` and so on. The mapping depends only on
/// the candidate order, so a rerun sees the same paths.
fn plan_destinations(candidates: Vec<PaperCandidate>, topic_dir: &Path) -> Vec<PlannedFetch> {
    // Names are claimed case-insensitively so "Alpha" and "alpha" never share
    // a file on case-insensitive file systems.
    let mut claimed: HashSet<String> = HashSet::new();
    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| {
            let stem = file_stem_for_title(&candidate.title);
            let mut file_name = format!("{stem}.{PDF_EXTENSION}");
            let mut suffix = 2_usize;
            while !claimed.insert(file_name.to_lowercase()) {
                file_name = format!("{stem}_{suffix}.{PDF_EXTENSION}");
                suffix += 1;
            }
            PlannedFetch {
                index,
                candidate,
                destination: topic_dir.join(file_name),
            }
        })
        .collect()
}
