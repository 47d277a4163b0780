//! Shared User-Agent strings for search and download HTTP clients.

/// Project URL for User-Agent identification on API traffic.
const PROJECT_UA_URL: &str = "https://github.com/fierce/arxiv-harvest";

/// Browser User-Agent sent with PDF downloads.
///
/// Some document hosts reject default or robotic user agents outright, so
/// downloads identify as a desktop browser.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default User-Agent for search API requests (identifies the tool).
#[must_use]
pub(crate) fn default_search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("arxiv-harvest/{version} (research-tool; +{PROJECT_UA_URL})")
}
