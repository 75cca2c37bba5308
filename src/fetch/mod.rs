//! Single-PDF download with content validation.
//!
//! [`PdfFetcher`] streams a response body to `<destination>.part`, checks it
//! with [`validate_pdf`], and renames it into place only when it is a real
//! PDF. Every failure path removes the partial file, so a failed fetch
//! never leaves anything at the destination. A fetch future dropped
//! mid-transfer removes its partial file as well.

mod error;
mod validate;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

pub use error::FetchError;
pub use validate::{PDF_MAGIC, PdfValidity, validate_pdf};

use crate::config::AcquisitionConfig;

/// Suffix of the in-progress download file.
const PARTIAL_SUFFIX: &str = ".part";

/// Terminal result of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// A valid PDF is now at the destination.
    Success,
    /// Network, HTTP, IO or URL failure.
    DownloadFailed,
    /// The body arrived but failed PDF validation.
    InvalidContent,
}

/// Downloads one URL to one destination path.
#[async_trait]
pub trait PdfFetch: Send + Sync {
    /// Fetches `url` into `destination`. Never panics and never returns an
    /// error; failures are reported through the status.
    async fn fetch(&self, url: &str, destination: &Path) -> FetchStatus;
}

/// HTTP PDF fetcher with a shared connection pool.
#[derive(Debug, Clone)]
pub struct PdfFetcher {
    client: Client,
    min_valid_size: u64,
}

impl PdfFetcher {
    /// Creates a fetcher.
    ///
    /// `timeout` bounds the whole transfer, including the body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        user_agent: &str,
        connect_timeout: Duration,
        timeout: Duration,
        min_valid_size: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|source| FetchError::ClientBuild { source })?;
        Ok(Self {
            client,
            min_valid_size,
        })
    }

    /// Creates a fetcher from run configuration.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn from_config(config: &AcquisitionConfig) -> Result<Self, FetchError> {
        Self::new(
            &config.user_agent,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.download_timeout_secs),
            config.min_valid_size,
        )
    }

    /// Downloads and validates, returning bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] for any failure; the partial file and any
    /// pre-existing destination file are removed first.
    pub async fn fetch_to_path(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        let partial = PartialFile::new(partial_path_for(destination));
        let result = self.fetch_inner(url, destination, partial.path()).await;
        match &result {
            Ok(_) => partial.keep(),
            Err(_) => {
                debug!(path = %partial.path().display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(partial.path()).await;
                let _ = tokio::fs::remove_file(destination).await;
            }
        }
        result
    }

    async fn fetch_inner(
        &self,
        url: &str,
        destination: &Path,
        partial_path: &Path,
    ) -> Result<u64, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(partial_path)
            .await
            .map_err(|e| FetchError::io(partial_path, e))?;
        let bytes_written = stream_to_file(&mut file, response, url, partial_path).await?;
        drop(file);

        let validity = validate_pdf(partial_path, self.min_valid_size)
            .await
            .map_err(|e| FetchError::io(partial_path, e))?;
        if !validity.is_valid() {
            return Err(FetchError::invalid_content(url, validity));
        }

        tokio::fs::rename(partial_path, destination)
            .await
            .map_err(|e| FetchError::io(destination, e))?;

        Ok(bytes_written)
    }
}

#[async_trait]
impl PdfFetch for PdfFetcher {
    #[instrument(skip(self, destination), fields(url = %url, path = %destination.display()))]
    async fn fetch(&self, url: &str, destination: &Path) -> FetchStatus {
        match self.fetch_to_path(url, destination).await {
            Ok(bytes) => {
                info!(bytes, "download complete");
                FetchStatus::Success
            }
            Err(FetchError::InvalidContent { validity, .. }) => {
                warn!(%validity, "downloaded file is not a valid PDF");
                FetchStatus::InvalidContent
            }
            Err(error) => {
                warn!(error = %error, "download failed");
                FetchStatus::DownloadFailed
            }
        }
    }
}

/// Removes the partial file when dropped before [`PartialFile::keep`], which
/// covers a fetch future cancelled mid-transfer.
struct PartialFile {
    path: PathBuf,
    armed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        // Drop cannot await.
        if self.armed && std::fs::remove_file(&self.path).is_ok() {
            debug!(path = %self.path.display(), "removed abandoned partial file");
        }
    }
}

/// `<destination>.part`, next to the destination.
fn partial_path_for(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}
