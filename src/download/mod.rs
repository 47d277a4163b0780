//! HTTP download of paper PDFs with fixed-delay retries.
//!
//! # Features
//!
//! - Streaming downloads (memory-efficient for large files)
//! - Locator normalization from arXiv abstract pages to PDF documents
//! - Configurable timeouts (30s connect, 60s per read by default)
//! - Typed failure classification: 429 gets a long cool-down, other
//!   failures a short fixed backoff
//! - No partial file is left behind when all attempts fail
//!
//! # Example
//!
//! ```no_run
//! use harvest_core::download::{HttpClient, RetryPolicy};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(RetryPolicy::default())?;
//! if client.download("https://arxiv.org/abs/2401.00001", Path::new("paper.pdf"), 3).await {
//!     println!("saved");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;
pub mod filename;
mod locator;
mod retry;

pub use client::HttpClient;
pub use constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_RATE_LIMIT_COOLDOWN, DEFAULT_RETRY_DELAY, READ_TIMEOUT_SECS,
};
pub use error::DownloadError;
pub use locator::normalize_locator;
pub use retry::{DEFAULT_MAX_ATTEMPTS, FailureType, RetryDecision, RetryPolicy, classify_error};
