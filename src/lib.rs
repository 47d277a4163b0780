//! arxiv-harvest core library
//!
//! Runs a fixed list of keyword queries against the arXiv search API,
//! downloads the PDFs of new papers into a local folder and remembers
//! which papers were already fetched.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`config`] - Harvest configuration, defaults and validation
//! - [`history`] - Persisted set of already-processed paper identifiers
//! - [`search`] - Search client trait and the arXiv Atom API client
//! - [`download`] - Retrying streamed PDF downloads
//! - [`sidecar`] - Plain-text metadata files written next to each PDF
//! - [`harvest`] - The orchestrator tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod harvest;
pub mod history;
pub mod search;
pub mod sidecar;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, HarvestConfig, Pacing};
pub use download::{
    DEFAULT_MAX_ATTEMPTS, DownloadError, FailureType, HttpClient, RetryDecision, RetryPolicy,
    classify_error, normalize_locator,
};
pub use harvest::{HarvestError, HarvestStats, Harvester, ItemOutcome};
pub use history::{HISTORY_FILE_NAME, HistoryError, HistoryStore};
pub use search::{ArxivSearchClient, CandidateItem, SearchClient, SearchError, SearchQuery};
pub use sidecar::{SidecarError, blog_search_links, write_info_sidecar};
