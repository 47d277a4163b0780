//! HTTP client wrapper for downloading paper PDFs.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with timeout configuration, fixed-delay retries and cleanup of
//! partially written files.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use super::locator::normalize_locator;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use crate::user_agent::BROWSER_USER_AGENT;

/// HTTP client for downloading files with streaming support.
///
/// Created once per run and reused for every paper, taking advantage of
/// connection pooling.
///
/// # Example
///
/// ```no_run
/// use harvest_core::download::{HttpClient, RetryPolicy};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(RetryPolicy::default())?;
/// let ok = client
///     .download("https://arxiv.org/abs/1706.03762", Path::new("./attention.pdf"), 3)
///     .await;
/// println!("downloaded: {ok}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 60 seconds without data
    /// - Browser User-Agent
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn new(retry_policy: RetryPolicy) -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS, retry_policy)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
        retry_policy: RetryPolicy,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            retry_policy,
        })
    }

    /// Returns the retry policy delays are taken from.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Downloads the document behind `locator` to `destination`.
    ///
    /// The locator is normalized first (abstract page → document, `.pdf`
    /// suffix). Up to `max_attempts` GET requests are made; after a failed
    /// attempt the client sleeps the short retry delay, or the long
    /// cool-down when the server answered 429.
    ///
    /// Returns `true` as soon as one attempt has streamed the whole body to
    /// disk. Returns `false` when every attempt failed; `destination` does not
    /// exist afterwards.
    #[instrument(skip(self), fields(locator = %locator, destination = %destination.display()))]
    pub async fn download(&self, locator: &str, destination: &Path, max_attempts: u32) -> bool {
        let url = match normalize_locator(locator) {
            Ok(url) => url,
            Err(error) => {
                warn!(error = %error, "cannot derive a document URL");
                return false;
            }
        };

        let policy = self.retry_policy.with_attempts(max_attempts);
        let mut attempt = 1;
        loop {
            let error = match self.download_to_file(&url, destination).await {
                Ok(bytes) => {
                    info!(url = %url, bytes, attempt, "download complete");
                    return true;
                }
                Err(error) => error,
            };

            let failure = classify_error(&error);
            warn!(
                attempt,
                max_attempts = policy.max_attempts(),
                ?failure,
                error = %error,
                "download attempt failed"
            );

            match policy.should_retry(failure, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    if failure == FailureType::RateLimited {
                        warn!(cooldown_secs = delay.as_secs(), "rate limited, cooling down");
                    }
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    remove_if_present(destination).await;
                    warn!(url = %url, reason = %reason, "giving up on download");
                    return false;
                }
            }
        }
    }

    /// Performs a single streamed GET of `url` into `destination`.
    ///
    /// Returns the number of bytes written. A partially written file is
    /// removed before an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Creating or writing the destination fails
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_to_file(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        let stream_result = stream_to_file(&mut file, response, url, destination).await;
        if stream_result.is_err() {
            debug!(path = %destination.display(), "cleaning up partial file after error");
            drop(file);
            remove_if_present(destination).await;
        }
        stream_result
    }
}

/// Streams the response body to `file` chunk by chunk.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

async fn remove_if_present(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "removed partial download"),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!(path = %path.display(), error = %error, "failed to remove partial download"),
    }
}
