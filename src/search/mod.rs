//! Paper search against a Semantic Scholar compatible endpoint.
//!
//! [`SearchClient`] issues one GET per attempt, retries rate-limited and
//! transient failures through a [`RetryPolicy`] and a [`Sleeper`], and
//! optionally serves a [`FallbackDataset`] once retries are exhausted.
//! Callers depend on the [`PaperSearch`] trait so the orchestrator can run
//! against a stub.

mod error;
mod fallback;
mod response;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::SearchError;
pub use fallback::{BundledFallback, FallbackDataset};
pub use response::UNTITLED_PAPER;

use crate::candidate::PaperCandidate;
use crate::config::AcquisitionConfig;
use crate::retry::{RetryDecision, RetryPolicy, Sleeper, TokioSleeper};
use crate::user_agent::default_search_user_agent;
use response::SearchResponse;

/// Fields requested from the search API.
pub const SEARCH_FIELDS: &str = "title,authors,year,citationCount,openAccessPdf,url,externalIds";

/// Largest `limit` the search API accepts per request.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Header carrying the optional API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Finds candidate papers for a topic.
#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Returns up to `limit` candidates in the order the source ranked them.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the source is unavailable and no
    /// fallback applies.
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<PaperCandidate>, SearchError>;
}

/// HTTP search client with bounded retry and optional offline fallback.
pub struct SearchClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    fallback: Option<Arc<dyn FallbackDataset>>,
}

impl SearchClient {
    /// Creates a client for `endpoint` with default retry and no fallback.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the endpoint is not an http(s) URL or the
    /// HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, SearchError> {
        let endpoint = Url::parse(endpoint).map_err(|_| SearchError::invalid_endpoint(endpoint))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(SearchError::invalid_endpoint(endpoint.as_str()));
        }

        let client = Client::builder()
            .user_agent(default_search_user_agent())
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .gzip(true)
            .build()
            .map_err(|source| SearchError::ClientBuild { source })?;

        Ok(Self {
            client,
            endpoint,
            api_key: None,
            policy: RetryPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            fallback: None,
        })
    }

    /// Creates a client from run configuration.
    ///
    /// The bundled fallback is attached when `use_fallback` is set.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_config(config: &AcquisitionConfig) -> Result<Self, SearchError> {
        let mut client = Self::new(
            &config.search_endpoint,
            Duration::from_secs(config.search_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )?
        .with_retry_policy(config.retry_policy());

        if let Some(key) = config.resolved_api_key() {
            client = client.with_api_key(key);
        }
        if config.use_fallback {
            client = client.with_fallback(Arc::new(BundledFallback));
        }
        Ok(client)
    }

    /// Sends `key` as `x-api-key` on every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the sleeper used between attempts.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Serves `fallback` when search fails after retries.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackDataset>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    fn request_url(&self, topic: &str, limit: usize) -> Result<Url, SearchError> {
        let limit = limit.min(MAX_SEARCH_LIMIT).to_string();
        Url::parse_with_params(
            self.endpoint.as_str(),
            &[
                ("query", topic),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ],
        )
        .map_err(|_| SearchError::invalid_endpoint(self.endpoint.as_str()))
    }

    async fn search_once(&self, url: &Url) -> Result<Vec<PaperCandidate>, SearchError> {
        let mut request = self.client.get(url.clone());
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(SearchError::network)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string);
            return Err(SearchError::http_status_with_retry_after(
                status.as_u16(),
                retry_after,
            ));
        }

        let body = response.bytes().await.map_err(SearchError::network)?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(SearchError::malformed)?;
        Ok(parsed.into_candidates())
    }

    async fn search_with_retry(
        &self,
        topic: &str,
        limit: usize,
    ) -> Result<Vec<PaperCandidate>, SearchError> {
        let url = self.request_url(topic, limit)?;
        let mut attempt = 1;

        loop {
            match self.search_once(&url).await {
                Ok(candidates) => return Ok(candidates),
                Err(error) => {
                    let failure_type = error.failure_type();
                    match self
                        .policy
                        .should_retry(failure_type, attempt, error.retry_after())
                    {
                        RetryDecision::Retry {
                            delay,
                            attempt: next_attempt,
                        } => {
                            warn!(
                                error = %error,
                                ?failure_type,
                                attempt,
                                delay_ms = delay.as_millis(),
                                "search failed, retrying"
                            );
                            self.sleeper.sleep(delay).await;
                            attempt = next_attempt;
                        }
                        RetryDecision::DoNotRetry { reason } => {
                            debug!(attempt, %reason, "not retrying search");
                            return Err(error);
                        }
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("has_api_key", &self.api_key.is_some())
            .field("policy", &self.policy)
            .field("has_fallback", &self.fallback.is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaperSearch for SearchClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn search(&self, topic: &str, limit: usize) -> Result<Vec<PaperCandidate>, SearchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        match self.search_with_retry(topic, limit).await {
            Ok(mut candidates) => {
                candidates.truncate(limit);
                info!(count = candidates.len(), "search returned candidates");
                Ok(candidates)
            }
            Err(error) => match &self.fallback {
                Some(fallback) => {
                    warn!(error = %error, "search unavailable, using fallback dataset");
                    let mut candidates = fallback.papers(topic);
                    candidates.truncate(limit);
                    Ok(candidates)
                }
                None => Err(error),
            },
        }
    }
}
