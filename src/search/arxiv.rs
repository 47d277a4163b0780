//! arXiv search client backed by the public Atom API.

use std::time::Duration;

use async_trait::async_trait;
use atom_syndication::{Entry, Feed};
use chrono::Datelike;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::{CandidateItem, SearchClient, SearchError, SearchQuery};
use crate::download::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::user_agent::default_search_user_agent;

/// Public arXiv query endpoint.
pub const ARXIV_API_ENDPOINT: &str = "https://export.arxiv.org/api/query";

/// Marker in entry ids the API uses to report query errors inside a feed.
const API_ERROR_MARKER: &str = "/api/errors";

/// Minimum gap between two requests to the API.
pub const DEFAULT_API_DELAY: Duration = Duration::from_secs(3);

/// Requests made for one query before it counts as failed.
pub const DEFAULT_SEARCH_ATTEMPTS: u32 = 3;

/// Search client for the arXiv Atom API.
///
/// Consecutive requests, retries included, are spaced at least `api_delay`
/// apart. Retryable failures are repeated up to `max_attempts` times per query.
#[derive(Debug)]
pub struct ArxivSearchClient {
    client: Client,
    endpoint: String,
    api_delay: Duration,
    max_attempts: u32,
    last_request: Mutex<Option<Instant>>,
}

impl ArxivSearchClient {
    /// Creates a client for the public endpoint with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_endpoint(ARXIV_API_ENDPOINT, CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a client for a custom endpoint (mirrors, tests).
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialized.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .gzip(true)
            .user_agent(default_search_user_agent())
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_delay: DEFAULT_API_DELAY,
            max_attempts: DEFAULT_SEARCH_ATTEMPTS,
            last_request: Mutex::new(None),
        })
    }

    /// Overrides the request spacing and per-query attempt cap.
    ///
    /// Attempt counts below 1 are raised to 1.
    #[must_use]
    pub fn with_pacing(mut self, api_delay: Duration, max_attempts: u32) -> Self {
        self.api_delay = api_delay;
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Builds the request URL for `query`, newest submissions first.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidEndpoint`] when the endpoint is not a URL.
    pub fn build_search_url(&self, query: &SearchQuery) -> Result<Url, SearchError> {
        let max_results = query.max_results.to_string();
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("search_query", query.expression.as_str()),
                ("start", "0"),
                ("max_results", max_results.as_str()),
                ("sortBy", "submittedDate"),
                ("sortOrder", "descending"),
            ],
        )
        .map_err(|_| SearchError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
        })
    }

    /// Sleeps until `api_delay` has passed since the previous request.
    async fn wait_for_slot(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.api_delay {
                let wait = self.api_delay - elapsed;
                debug!(?wait, "spacing API requests");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// One paced request for `query`.
    async fn fetch(&self, query: &SearchQuery, url: Url) -> Result<Vec<CandidateItem>, SearchError> {
        self.wait_for_slot().await;

        let network = |source| SearchError::Network {
            query: query.expression.clone(),
            source,
        };
        let response = self.client.get(url).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::from_status(&query.expression, status.as_u16()));
        }

        // Read the whole body before touching any item.
        let body = response.bytes().await.map_err(network)?;
        parse_feed(&body).map_err(|reason| SearchError::parse(&query.expression, reason))
    }
}

#[async_trait]
impl SearchClient for ArxivSearchClient {
    fn name(&self) -> &'static str {
        "arxiv"
    }

    #[instrument(skip(self), fields(query = %query.expression, max_results = query.max_results))]
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateItem>, SearchError> {
        let url = self.build_search_url(query)?;
        debug!(url = %url, "querying arXiv");

        let mut attempt = 1;
        loop {
            match self.fetch(query, url.clone()).await {
                Ok(items) => {
                    info!(results = items.len(), attempt, "search complete");
                    return Ok(items);
                }
                Err(error) if error.is_retryable() && attempt < self.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "search attempt failed, retrying"
                    );
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Parses an arXiv Atom response into candidate items.
///
/// Entries without a usable identifier are skipped.
///
/// # Errors
///
/// Returns a description of the problem when the body is not an Atom feed
/// or the API reported a query error inside the feed.
pub fn parse_feed(body: &[u8]) -> Result<Vec<CandidateItem>, String> {
    let feed = Feed::read_from(body).map_err(|e| format!("Atom parse error: {e}"))?;

    let mut items = Vec::with_capacity(feed.entries().len());
    for entry in feed.entries() {
        if entry.id().contains(API_ERROR_MARKER) {
            let detail = entry
                .summary()
                .map(|s| collapse_whitespace(s.as_str()))
                .unwrap_or_default();
            return Err(format!("API error: {detail}"));
        }
        match candidate_from_entry(entry) {
            Some(item) => items.push(item),
            None => warn!(entry_id = %entry.id(), "skipping entry without identifier"),
        }
    }
    Ok(items)
}

fn candidate_from_entry(entry: &Entry) -> Option<CandidateItem> {
    let id = entry
        .id()
        .trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())?
        .to_string();

    let published = entry.published().unwrap_or_else(|| entry.updated());

    Some(CandidateItem {
        id,
        title: collapse_whitespace(entry.title().as_str()),
        published_year: published.year(),
        summary: entry
            .summary()
            .map(|s| collapse_whitespace(s.as_str()))
            .unwrap_or_default(),
        locator: document_locator(entry),
    })
}

/// Picks the best download link: the link titled `pdf`, then the
/// `alternate` (abstract page) link, then the entry id itself.
fn document_locator(entry: &Entry) -> String {
    let links = entry.links();
    links
        .iter()
        .find(|link| link.title() == Some("pdf"))
        .or_else(|| links.iter().find(|link| link.rel() == "alternate"))
        .map_or_else(|| entry.id().trim().to_string(), |link| link.href().to_string())
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
