//! Orchestrator: queries → candidate items → filters → download → record.
//!
//! For every configured query the [`Harvester`] fetches the full result list,
//! then walks it item by item:
//!
//! 1. items published before the cutoff year are skipped,
//! 2. identifiers already in the history are skipped,
//! 3. items whose PDF already exists on disk are recorded as seen and skipped,
//! 4. everything else is downloaded; on success a sidecar is written and the
//!    history is persisted immediately.
//!
//! A failing query is logged and followed by a cool-down; a failing item is
//! logged and skipped. Neither ends the run.

mod stats;

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfigError, HarvestConfig};
use crate::download::HttpClient;
use crate::download::filename::{file_stem, pdf_path, sidecar_path};
use crate::history::{HistoryError, HistoryStore};
use crate::search::{ArxivSearchClient, CandidateItem, SearchClient, SearchError, SearchQuery};
use crate::sidecar::{SidecarError, write_info_sidecar};

pub use stats::HarvestStats;

/// Errors surfaced while setting up or processing a single item.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// Sidecar could not be written.
    #[error(transparent)]
    Sidecar(#[from] SidecarError),

    /// History could not be persisted.
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// What happened to one candidate item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Published before the cutoff year.
    TooOld,
    /// Identifier already in the history.
    AlreadySeen,
    /// PDF already on disk; identifier recorded without downloading.
    AlreadyOnDisk,
    /// Downloaded, sidecar written, history persisted.
    Downloaded,
    /// Every download attempt failed; history untouched.
    DownloadFailed,
}

/// Runs the configured queries and downloads new papers.
pub struct Harvester {
    config: HarvestConfig,
    search: Box<dyn SearchClient>,
    http: HttpClient,
    history: HistoryStore,
    seen: HashSet<String>,
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("search", &self.search.name())
            .field("base_directory", &self.config.base_directory)
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl Harvester {
    /// Creates a harvester and loads the persisted history.
    #[must_use]
    pub fn new(config: HarvestConfig, search: Box<dyn SearchClient>, http: HttpClient) -> Self {
        let history = HistoryStore::new(config.history_path());
        let seen = history.load();
        info!(
            seen = seen.len(),
            history = %history.path().display(),
            "history loaded"
        );
        Self {
            config,
            search,
            http,
            history,
            seen,
        }
    }

    /// Validates `config` and builds the arXiv search client and download
    /// client it describes.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Config`] for invalid configuration and
    /// [`HarvestError::Client`] when an HTTP client cannot be built.
    pub fn from_config(config: HarvestConfig) -> Result<Self, HarvestError> {
        config.validate()?;
        let search = ArxivSearchClient::with_endpoint(
            config.search_endpoint.clone(),
            config.connect_timeout_secs,
            config.read_timeout_secs,
        )?
        .with_pacing(config.pacing.api_delay, config.max_search_attempts);
        let http = HttpClient::with_timeouts(
            config.connect_timeout_secs,
            config.read_timeout_secs,
            config.retry_policy(),
        )?;
        Ok(Self::new(config, Box::new(search), http))
    }

    /// Identifiers recorded so far (persisted plus this run).
    #[must_use]
    pub fn seen(&self) -> &HashSet<String> {
        &self.seen
    }

    /// Runs every configured query once.
    pub async fn run(&mut self) -> HarvestStats {
        let mut stats = HarvestStats::default();
        let queries = self.config.queries.clone();

        for query in &queries {
            match self.run_query(query, &mut stats).await {
                Ok(()) => stats.queries_completed += 1,
                Err(error) => {
                    stats.queries_failed += 1;
                    let cooldown = self.config.pacing.query_cooldown;
                    if error.is_rate_limited() {
                        warn!(query = %query, cooldown_secs = cooldown.as_secs(), "search rate limited, cooling down");
                    } else {
                        warn!(query = %query, error = %error, cooldown_secs = cooldown.as_secs(), "search failed, cooling down");
                    }
                    tokio::time::sleep(cooldown).await;
                }
            }
        }

        info!(
            downloaded = stats.downloaded,
            failed = stats.download_failed,
            on_disk = stats.already_on_disk,
            seen = stats.already_seen,
            too_old = stats.too_old,
            item_errors = stats.item_errors,
            queries_failed = stats.queries_failed,
            "harvest finished"
        );
        stats
    }

    #[instrument(skip(self, stats), fields(query = %query))]
    async fn run_query(&mut self, query: &str, stats: &mut HarvestStats) -> Result<(), SearchError> {
        info!("searching");
        let request = SearchQuery::newest_first(query, self.config.max_results_per_query);
        // The result list is fully materialized before any item is processed.
        let items = self.search.search(&request).await?;
        debug!(results = items.len(), "processing results");

        for item in &items {
            match self.process_item(item).await {
                Ok(outcome) => stats.record(outcome),
                Err(error) => {
                    stats.item_errors += 1;
                    warn!(id = %item.id, error = %error, "item failed, skipping");
                }
            }
        }
        Ok(())
    }

    /// Filters, downloads and records a single candidate.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError`] when the sidecar or history cannot be
    /// written. Download failures are an [`ItemOutcome`], not an error.
    #[instrument(skip(self, item), fields(id = %item.id, year = item.published_year))]
    pub async fn process_item(&mut self, item: &CandidateItem) -> Result<ItemOutcome, HarvestError> {
        if item.published_year < self.config.cutoff_year {
            debug!(cutoff = self.config.cutoff_year, "published before cutoff, skipping");
            return Ok(ItemOutcome::TooOld);
        }

        if self.seen.contains(&item.id) {
            debug!("already in history, skipping");
            return Ok(ItemOutcome::AlreadySeen);
        }

        let stem = file_stem(&item.title, &item.id);
        let pdf = pdf_path(&self.config.base_directory, &stem);
        if pdf.exists() {
            debug!(path = %pdf.display(), "already on disk, recording as seen");
            self.record_seen(&item.id)?;
            return Ok(ItemOutcome::AlreadyOnDisk);
        }

        info!(title = %truncate_for_log(&stem), "downloading");
        if !self
            .http
            .download(&item.locator, &pdf, self.config.max_download_attempts)
            .await
        {
            warn!(locator = %item.locator, "download failed after all attempts, skipping");
            return Ok(ItemOutcome::DownloadFailed);
        }

        let sidecar = sidecar_path(&self.config.base_directory, &stem);
        write_info_sidecar(&sidecar, item)?;
        self.record_seen(&item.id)?;
        info!(path = %pdf.display(), "paper saved");

        tokio::time::sleep(self.config.pacing.politeness_delay).await;
        Ok(ItemOutcome::Downloaded)
    }

    /// Destination PDF path for `item`.
    #[must_use]
    pub fn destination_for(&self, item: &CandidateItem) -> PathBuf {
        pdf_path(&self.config.base_directory, &file_stem(&item.title, &item.id))
    }

    fn record_seen(&mut self, id: &str) -> Result<(), HistoryError> {
        self.seen.insert(id.to_string());
        self.history.save(&self.seen)
    }
}

fn truncate_for_log(value: &str) -> String {
    value.chars().take(40).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::config::Pacing;
    use crate::download::RetryPolicy;

    /// Search client returning canned results and counting calls.
    struct StubSearch {
        results: Vec<CandidateItem>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchClient for StubSearch {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn search(&self, query: &SearchQuery) -> Result<Vec<CandidateItem>, SearchError> {
            self.calls.lock().unwrap().push(query.expression.clone());
            Ok(self.results.clone())
        }
    }

    fn item(id: &str, year: i32) -> CandidateItem {
        CandidateItem {
            id: id.to_string(),
            title: format!("Paper {id}"),
            published_year: year,
            summary: "summary".to_string(),
            // Unroutable: any download attempt fails fast.
            locator: "http://127.0.0.1:9/abs/unreachable".to_string(),
        }
    }

    fn harvester(dir: &Path, results: Vec<CandidateItem>) -> Harvester {
        let config = HarvestConfig {
            queries: vec!["q".to_string()],
            base_directory: dir.to_path_buf(),
            max_download_attempts: 1,
            pacing: Pacing::none(),
            ..HarvestConfig::default()
        };
        let http =
            HttpClient::with_timeouts(1, 2, RetryPolicy::new(1, Duration::ZERO, Duration::ZERO))
                .unwrap();
        let search = StubSearch {
            results,
            calls: Mutex::new(Vec::new()),
        };
        Harvester::new(config, Box::new(search), http)
    }

    #[tokio::test]
    async fn test_old_items_are_filtered_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut harvester = harvester(temp_dir.path(), Vec::new());

        let outcome = harvester.process_item(&item("2201.00001", 2022)).await.unwrap();

        assert_eq!(outcome, ItemOutcome::TooOld);
        assert!(harvester.seen().is_empty());
    }

    #[tokio::test]
    async fn test_existing_file_is_recorded_without_download() {
        let temp_dir = TempDir::new().unwrap();
        let mut harvester = harvester(temp_dir.path(), Vec::new());
        let candidate = item("2401.00001", 2024);
        let pdf = harvester.destination_for(&candidate);
        std::fs::write(&pdf, b"%PDF-1.7 existing").unwrap();

        let outcome = harvester.process_item(&candidate).await.unwrap();

        assert_eq!(outcome, ItemOutcome::AlreadyOnDisk);
        assert!(harvester.seen().contains("2401.00001"));
        assert_eq!(std::fs::read(&pdf).unwrap(), b"%PDF-1.7 existing");
        let persisted = HistoryStore::in_dir(temp_dir.path()).load();
        assert!(persisted.contains("2401.00001"));
    }

    #[tokio::test]
    async fn test_seen_items_are_skipped_before_disk_check() {
        let temp_dir = TempDir::new().unwrap();
        let store = HistoryStore::in_dir(temp_dir.path());
        store
            .save(&["2401.00001".to_string()].into_iter().collect())
            .unwrap();
        let mut harvester = harvester(temp_dir.path(), Vec::new());

        let outcome = harvester.process_item(&item("2401.00001", 2024)).await.unwrap();

        assert_eq!(outcome, ItemOutcome::AlreadySeen);
    }

    #[tokio::test]
    async fn test_failed_download_leaves_history_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let mut harvester = harvester(temp_dir.path(), Vec::new());
        let candidate = item("2401.00002", 2024);

        let outcome = harvester.process_item(&candidate).await.unwrap();

        assert_eq!(outcome, ItemOutcome::DownloadFailed);
        assert!(harvester.seen().is_empty());
        assert!(!harvester.destination_for(&candidate).exists());
        assert!(!temp_dir.path().join("download_history.json").exists());
    }

    #[tokio::test]
    async fn test_run_counts_outcomes_per_query() {
        let temp_dir = TempDir::new().unwrap();
        let results = vec![item("2201.00001", 2022), item("2401.00003", 2024)];
        let mut harvester = harvester(temp_dir.path(), results);

        let stats = harvester.run().await;

        assert_eq!(stats.queries_completed, 1);
        assert_eq!(stats.too_old, 1);
        assert_eq!(stats.download_failed, 1);
        assert_eq!(stats.downloaded, 0);
    }

    #[test]
    fn test_truncate_for_log_counts_characters() {
        assert_eq!(truncate_for_log(&"机".repeat(50)).chars().count(), 40);
    }
}
