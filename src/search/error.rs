//! Error types for search operations.

use thiserror::Error;

/// Errors that can occur while running a search query.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The API answered 429.
    #[error("search API rate limited the request for '{query}'")]
    RateLimited {
        /// The query expression.
        query: String,
    },

    /// The API answered with another non-success status.
    #[error("search API returned HTTP {status} for '{query}'")]
    HttpStatus {
        /// The query expression.
        query: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Transport failure, including timeouts.
    #[error("network error searching '{query}': {source}")]
    Network {
        /// The query expression.
        query: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not a valid feed.
    #[error("malformed search response for '{query}': {reason}")]
    Parse {
        /// The query expression.
        query: String,
        /// What was wrong with the body.
        reason: String,
    },

    /// The configured endpoint is not a valid URL.
    #[error("invalid search endpoint: {endpoint}")]
    InvalidEndpoint {
        /// The configured endpoint.
        endpoint: String,
    },
}

impl SearchError {
    /// Creates the error for a non-success status, promoting 429.
    pub fn from_status(query: impl Into<String>, status: u16) -> Self {
        if status == 429 {
            Self::RateLimited {
                query: query.into(),
            }
        } else {
            Self::HttpStatus {
                query: query.into(),
                status,
            }
        }
    }

    /// Creates a parse error.
    pub fn parse(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Returns true when the failure is a rate-limit signal.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true when repeating the same request may succeed.
    ///
    /// A bad endpoint or a body that does not parse will not get better on
    /// a second try.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::HttpStatus { .. } | Self::Network { .. }
        )
    }
}
