use std::time::Duration;

use thiserror::Error;

/// Errors from [`crate::search::FeatureSearch::search`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request never produced an HTTP response.
    #[error("network error requesting {url}: {message}")]
    Network {
        /// Request URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request did not complete in time.
    #[error("search timed out after {timeout:?}")]
    Timeout {
        /// Time allowed for the request.
        timeout: Duration,
    },
    /// The service reported an application-level failure.
    #[error("search service error {code}: {message}")]
    Service {
        /// Service-specific status code.
        code: i64,
        /// Message supplied by the service.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse search response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}
