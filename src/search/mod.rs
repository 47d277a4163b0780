//! Search clients that turn a keyword query into candidate papers.
//!
//! The [`SearchClient`] trait is the boundary the orchestrator talks to;
//! [`ArxivSearchClient`] implements it against the arXiv Atom API.

mod arxiv;
mod error;

use async_trait::async_trait;

pub use arxiv::{
    ARXIV_API_ENDPOINT, ArxivSearchClient, DEFAULT_API_DELAY, DEFAULT_SEARCH_ATTEMPTS, parse_feed,
};
pub use error::SearchError;

/// One search request. Results always come newest submission first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Boolean keyword expression, e.g. `"Embodied AI" AND "Transformer"`.
    pub expression: String,
    /// Maximum number of results to return.
    pub max_results: u32,
}

impl SearchQuery {
    /// Newest-first query for `expression` capped at `max_results`.
    #[must_use]
    pub fn newest_first(expression: impl Into<String>, max_results: u32) -> Self {
        Self {
            expression: expression.into(),
            max_results,
        }
    }
}

/// A search result before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    /// Identifier, unique within the index (e.g. `2401.00001v1`).
    pub id: String,
    /// Paper title.
    pub title: String,
    /// Year of first publication.
    pub published_year: i32,
    /// Abstract.
    pub summary: String,
    /// Where the document can be fetched from.
    pub locator: String,
}

/// Trait that all search backends implement.
///
/// Implementations return the complete, ordered result list; callers never
/// hold a connection open while they process items.
///
/// # Object Safety
///
/// This trait uses `async_trait` to support dynamic dispatch via
/// `Box<dyn SearchClient>`.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Returns the backend's name (e.g. "arxiv").
    fn name(&self) -> &str;

    /// Runs `query` and returns the matching items.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateItem>, SearchError>;
}
