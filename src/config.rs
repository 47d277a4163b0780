//! Harvest configuration passed explicitly to the orchestrator.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::download::{
    CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_RETRY_DELAY,
    READ_TIMEOUT_SECS, RetryPolicy,
};
use crate::history::HISTORY_FILE_NAME;
use crate::search::{ARXIV_API_ENDPOINT, DEFAULT_API_DELAY, DEFAULT_SEARCH_ATTEMPTS};

/// Queries run when no configuration overrides them.
pub const DEFAULT_QUERIES: [&str; 5] = [
    r#""Humanoid Robot" AND "Reinforcement Learning""#,
    r#""Embodied AI" AND "Transformer""#,
    r#""Vision-Language-Action""#,
    r#""Sim-to-Real" AND "Humanoid""#,
    r#""Robot Manipulation" AND "Foundation Model""#,
];

/// Default folder papers are saved to.
pub const DEFAULT_BASE_DIRECTORY: &str = "Humanoid_Brain_Papers";

/// Papers published before this year are ignored.
pub const DEFAULT_CUTOFF_YEAR: i32 = 2023;

/// Result cap per query.
pub const DEFAULT_MAX_RESULTS_PER_QUERY: u32 = 10;

/// Upper bound accepted for the per-query result cap.
pub const MAX_RESULTS_PER_QUERY_LIMIT: u32 = 2000;

/// Upper bound accepted for download and search attempts.
pub const MAX_DOWNLOAD_ATTEMPTS_LIMIT: u32 = 10;

/// Pause after a failed query.
pub const DEFAULT_QUERY_COOLDOWN: Duration = Duration::from_secs(20);

/// Pause after every successful download.
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_secs(5);

/// Errors produced by configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No queries configured.
    #[error("no queries configured")]
    NoQueries,

    /// A query is empty or whitespace.
    #[error("query #{index} is empty")]
    EmptyQuery {
        /// 1-based position of the query.
        index: usize,
    },

    /// A numeric option is outside its accepted range.
    #[error("invalid value for `{field}`: {value}. Expected range: {min}..={max}")]
    OutOfRange {
        /// Option name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Lowest accepted value.
        min: u64,
        /// Highest accepted value.
        max: u64,
    },

    /// The base directory path is empty.
    #[error("base directory must not be empty")]
    EmptyBaseDirectory,
}

/// Fixed delays used between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Backoff after an ordinary failed download attempt.
    pub retry_delay: Duration,
    /// Cool-down after a download attempt answered 429.
    pub rate_limit_cooldown: Duration,
    /// Cool-down after a failed query.
    pub query_cooldown: Duration,
    /// Pause after each successful download.
    pub politeness_delay: Duration,
    /// Minimum gap between two search API requests.
    pub api_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            retry_delay: DEFAULT_RETRY_DELAY,
            rate_limit_cooldown: DEFAULT_RATE_LIMIT_COOLDOWN,
            query_cooldown: DEFAULT_QUERY_COOLDOWN,
            politeness_delay: DEFAULT_POLITENESS_DELAY,
            api_delay: DEFAULT_API_DELAY,
        }
    }
}

impl Pacing {
    /// No delays at all.
    #[must_use]
    pub fn none() -> Self {
        Self {
            retry_delay: Duration::ZERO,
            rate_limit_cooldown: Duration::ZERO,
            query_cooldown: Duration::ZERO,
            politeness_delay: Duration::ZERO,
            api_delay: Duration::ZERO,
        }
    }
}

/// Everything one harvest run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Keyword expressions, run in order.
    pub queries: Vec<String>,
    /// Folder receiving PDFs, sidecars and the history file.
    pub base_directory: PathBuf,
    /// Items published before this year are skipped.
    pub cutoff_year: i32,
    /// Result cap per query.
    pub max_results_per_query: u32,
    /// Download attempts per paper.
    pub max_download_attempts: u32,
    /// Search requests per query before the query counts as failed.
    pub max_search_attempts: u32,
    /// Fixed delays.
    pub pacing: Pacing,
    /// Search API endpoint.
    pub search_endpoint: String,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// HTTP read timeout in seconds (longest gap without data).
    pub read_timeout_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(ToString::to_string).collect(),
            base_directory: PathBuf::from(DEFAULT_BASE_DIRECTORY),
            cutoff_year: DEFAULT_CUTOFF_YEAR,
            max_results_per_query: DEFAULT_MAX_RESULTS_PER_QUERY,
            max_download_attempts: DEFAULT_MAX_ATTEMPTS,
            max_search_attempts: DEFAULT_SEARCH_ATTEMPTS,
            pacing: Pacing::default(),
            search_endpoint: ARXIV_API_ENDPOINT.to_string(),
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl HarvestConfig {
    /// Checks the configuration for values the harvest cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queries.is_empty() {
            return Err(ConfigError::NoQueries);
        }
        if let Some(index) = self.queries.iter().position(|q| q.trim().is_empty()) {
            return Err(ConfigError::EmptyQuery { index: index + 1 });
        }
        if self.base_directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBaseDirectory);
        }
        check_range(
            "max_results_per_query",
            u64::from(self.max_results_per_query),
            1,
            u64::from(MAX_RESULTS_PER_QUERY_LIMIT),
        )?;
        check_range(
            "max_download_attempts",
            u64::from(self.max_download_attempts),
            1,
            u64::from(MAX_DOWNLOAD_ATTEMPTS_LIMIT),
        )?;
        check_range(
            "max_search_attempts",
            u64::from(self.max_search_attempts),
            1,
            u64::from(MAX_DOWNLOAD_ATTEMPTS_LIMIT),
        )?;
        check_range("connect_timeout_secs", self.connect_timeout_secs, 1, 3600)?;
        check_range("read_timeout_secs", self.read_timeout_secs, 1, 3600)?;
        Ok(())
    }

    /// Path of the history file inside the base directory.
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.base_directory.join(HISTORY_FILE_NAME)
    }

    /// Retry policy for downloads derived from the attempt cap and pacing.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_download_attempts,
            self.pacing.retry_delay,
            self.pacing.rate_limit_cooldown,
        )
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
