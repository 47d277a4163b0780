//! Constants for the download module: timeouts and fixed retry delays.

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default read timeout (60 seconds without any data arriving).
///
/// Applies per read, not to the whole transfer, so a slow but live download
/// of a large PDF is never cut off.
pub const READ_TIMEOUT_SECS: u64 = 60;

/// Short fixed backoff between ordinary failed attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long cool-down after the server signals rate limiting (HTTP 429).
pub const DEFAULT_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

/// Suffix every document locator must carry.
pub const PDF_SUFFIX: &str = ".pdf";
