//! Named configuration for an acquisition run.
//!
//! Every tunable the pipeline uses lives in [`AcquisitionConfig`] and is
//! passed into the orchestrator explicitly. Values come from built-in
//! defaults, optionally overridden by a TOML file, then by CLI flags.
//!
//! ```toml
//! output_root = "papers"
//! max_limit = 20
//! concurrency = 6
//! use_fallback = true
//! manifest_mode = "success_only"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryPolicy;
use crate::user_agent::BROWSER_USER_AGENT;

/// Default Semantic Scholar paper search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.semanticscholar.org/graph/v1/paper/search";

/// Default directory holding one sub-directory per topic.
pub const DEFAULT_OUTPUT_ROOT: &str = "downloaded_papers";

/// Default hard cap on papers per run.
pub const DEFAULT_MAX_LIMIT: usize = 10;

/// Default ratio of search results to requested papers.
pub const DEFAULT_SEARCH_BUFFER_MULTIPLIER: usize = 5;

/// Default minimum size for a file to count as a PDF.
pub const DEFAULT_MIN_VALID_SIZE: u64 = 1000;

/// Default number of concurrent downloads.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default manifest file name inside a topic directory.
pub const DEFAULT_MANIFEST_FILE_NAME: &str = "manifest.json";

/// Environment variable consulted for a search API key.
pub const API_KEY_ENV_VAR: &str = "SEMANTIC_SCHOLAR_API_KEY";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that failed.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown keys.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its accepted range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    InvalidValue {
        /// Offending key.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Human-readable accepted range.
        expected: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, value: impl ToString, expected: &'static str) -> Self {
        Self::InvalidValue {
            field,
            value: value.to_string(),
            expected,
        }
    }
}

/// Which outcomes end up in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestMode {
    /// Every outcome, including failures.
    #[default]
    All,
    /// Only outcomes with a file on disk.
    SuccessOnly,
}

/// Configuration for one acquisition run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcquisitionConfig {
    /// Parent directory of the per-topic directories.
    pub output_root: PathBuf,
    /// Hard cap on papers per run; larger requests are clamped.
    pub max_limit: usize,
    /// Search for `requested * multiplier` candidates to absorb paywalls and broken links.
    pub search_buffer_multiplier: usize,
    /// Paper search endpoint URL.
    pub search_endpoint: String,
    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,
    /// Search retries after the first attempt.
    pub max_retries: u32,
    /// Fixed wait after a rate-limited or transient search failure.
    pub rate_limit_backoff_secs: u64,
    /// Overall timeout of one search request.
    pub search_timeout_secs: u64,
    /// TCP connect timeout for all requests.
    pub connect_timeout_secs: u64,
    /// Overall timeout of one PDF download.
    pub download_timeout_secs: u64,
    /// Files smaller than this are treated as error pages.
    pub min_valid_size: u64,
    /// Maximum concurrent downloads.
    pub concurrency: usize,
    /// Return the bundled offline dataset when search is unavailable.
    pub use_fallback: bool,
    /// Order eligible candidates by citation count.
    pub order_by_citations: bool,
    /// Which outcomes the manifest records.
    pub manifest_mode: ManifestMode,
    /// Manifest file name inside the topic directory.
    pub manifest_file_name: String,
    /// User-Agent for PDF downloads.
    pub user_agent: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            max_limit: DEFAULT_MAX_LIMIT,
            search_buffer_multiplier: DEFAULT_SEARCH_BUFFER_MULTIPLIER,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_key: None,
            max_retries: crate::retry::DEFAULT_MAX_RETRIES,
            rate_limit_backoff_secs: crate::retry::DEFAULT_BACKOFF.as_secs(),
            search_timeout_secs: 10,
            connect_timeout_secs: 10,
            download_timeout_secs: 30,
            min_valid_size: DEFAULT_MIN_VALID_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            use_fallback: false,
            order_by_citations: true,
            manifest_mode: ManifestMode::All,
            manifest_file_name: DEFAULT_MANIFEST_FILE_NAME.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl AcquisitionConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, otherwise
    /// the same errors as [`Self::from_toml_str`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Loads the default config file if it exists, else built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::from_file`] for an existing but invalid file.
    pub fn load_default() -> Result<Self, ConfigError> {
        match resolve_default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Checks every value against its accepted range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.max_limit) {
            return Err(ConfigError::invalid("max_limit", self.max_limit, "1..=100"));
        }
        if !(1..=20).contains(&self.search_buffer_multiplier) {
            return Err(ConfigError::invalid(
                "search_buffer_multiplier",
                self.search_buffer_multiplier,
                "1..=20",
            ));
        }
        if self.max_retries > 10 {
            return Err(ConfigError::invalid("max_retries", self.max_retries, "0..=10"));
        }
        if self.rate_limit_backoff_secs > 300 {
            return Err(ConfigError::invalid(
                "rate_limit_backoff_secs",
                self.rate_limit_backoff_secs,
                "0..=300",
            ));
        }
        validate_timeout_secs("search_timeout_secs", self.search_timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("download_timeout_secs", self.download_timeout_secs)?;
        if self.min_valid_size < 5 {
            return Err(ConfigError::invalid(
                "min_valid_size",
                self.min_valid_size,
                ">= 5",
            ));
        }
        if !(1..=16).contains(&self.concurrency) {
            return Err(ConfigError::invalid("concurrency", self.concurrency, "1..=16"));
        }
        if url::Url::parse(&self.search_endpoint).is_err() {
            return Err(ConfigError::invalid(
                "search_endpoint",
                &self.search_endpoint,
                "absolute http(s) URL",
            ));
        }
        let manifest_name = self.manifest_file_name.as_str();
        if manifest_name.is_empty()
            || manifest_name.contains(['/', '\\'])
            || manifest_name.starts_with('.')
        {
            return Err(ConfigError::invalid(
                "manifest_file_name",
                manifest_name,
                "plain file name",
            ));
        }
        Ok(())
    }

    /// Retry policy for the search phase.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.rate_limit_backoff_secs),
        )
    }

    /// API key from config, else from [`API_KEY_ENV_VAR`].
    #[must_use]
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var(API_KEY_ENV_VAR).ok())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

fn validate_timeout_secs(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if (1..=3600).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, value, "1..=3600"))
    }
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/paperfetch/config.toml`
/// 2. `$HOME/.config/paperfetch/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("paperfetch")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("paperfetch")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}
