use std::path::PathBuf;

use thiserror::Error;

/// Error types for feed construction, fetching and decoding.
///
/// The variants fall into three groups:
/// - transport failures (`Network`, `Timeout`, `HttpStatus`, `Client`)
/// - decode failures (`Decode`, `UnexpectedDocument`)
/// - configuration failures (`UnknownFeedType`, `InvalidUrl`, `InvalidCoordinate`,
///   `InvalidFilter`, `Config`, `ConfigNotFound`)
///
/// Transport and decode failures never escape a fetch: the feed source turns
/// them into an error snapshot and the reconciliation engine reacts to that
/// uniformly. Configuration failures surface synchronously when a feed is
/// built and are fatal to that feed.
///
/// # Examples
///
/// ```
/// use geofeed_core::error::FeedError;
///
/// let err = FeedError::UnknownFeedType("past_decade_all".to_string());
/// assert!(err.is_configuration());
/// assert!(!err.is_retryable());
/// ```
#[derive(Error, Debug)]
pub enum FeedError {
    /// Network or connection error.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Any other HTTP client failure (request building, body read).
    #[error("HTTP client error: {0}")]
    Client(String),

    /// The document is not valid JSON or does not match the GeoJSON shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The document is valid JSON but not a feature collection.
    #[error("Unexpected document type: {0}")]
    UnexpectedDocument(String),

    /// A named feed variant that the adapter does not know.
    #[error("Unknown feed type: {0}")]
    UnknownFeedType(String),

    /// Feed URL could not be parsed.
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    /// Latitude/longitude outside of the valid range or not finite.
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// A filter setting that can never be satisfied sensibly.
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    /// The feeds configuration file is malformed or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The feeds configuration file does not exist.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Filesystem error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Network(msg) => {
                format!("Network error: {}\n   Check your internet connection.", msg)
            }
            FeedError::Timeout(secs) => {
                format!(
                    "Request timed out after {} seconds.\n   The feed server may be overloaded. Try again later.",
                    secs
                )
            }
            FeedError::HttpStatus { status, url } => {
                format!(
                    "The feed server answered HTTP {} for {}.\n   Check the feed URL.",
                    status, url
                )
            }
            FeedError::Decode(e) => {
                format!("The feed returned malformed GeoJSON: {}", e)
            }
            FeedError::UnknownFeedType(name) => {
                format!(
                    "Unknown feed type: {}\n   Run `geofeed feed-types` for the supported names.",
                    name
                )
            }
            FeedError::InvalidUrl(url) => {
                format!(
                    "Invalid feed URL: {}\n   Example: https://example.org/feed.geojson",
                    url
                )
            }
            FeedError::ConfigNotFound(path) => {
                format!(
                    "No feeds configuration at {}\n   Create one or pass --config <PATH>.",
                    path.display()
                )
            }
            _ => self.to_string(),
        }
    }

    /// Returns true for network, timeout and HTTP failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedError::Network(_)
                | FeedError::Timeout(_)
                | FeedError::HttpStatus { .. }
                | FeedError::Client(_)
        )
    }

    /// Returns true for malformed or non-conforming documents.
    pub fn is_decode(&self) -> bool {
        matches!(self, FeedError::Decode(_) | FeedError::UnexpectedDocument(_))
    }

    /// Returns true for errors raised while building a feed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FeedError::UnknownFeedType(_)
                | FeedError::InvalidUrl(_)
                | FeedError::InvalidCoordinate { .. }
                | FeedError::InvalidFilter(_)
                | FeedError::Config(_)
                | FeedError::ConfigNotFound(_)
        )
    }

    /// Returns true if a later attempt could plausibly succeed.
    ///
    /// Nothing in this workspace retries on its own; this is advice for the
    /// hosting application wrapping `update()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use geofeed_core::error::FeedError;
    ///
    /// assert!(FeedError::Timeout(10).is_retryable());
    /// assert!(FeedError::HttpStatus { status: 503, url: "https://a.b/".into() }.is_retryable());
    /// assert!(!FeedError::HttpStatus { status: 404, url: "https://a.b/".into() }.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::Network(_) | FeedError::Timeout(_) => true,
            FeedError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FeedError::UnknownFeedType("nope".to_string());
        assert_eq!(err.to_string(), "Unknown feed type: nope");
    }

    #[test]
    fn test_http_status_display() {
        let err = FeedError::HttpStatus {
            status: 500,
            url: "https://example.org/feed.json".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500 from https://example.org/feed.json");
    }

    #[test]
    fn test_timeout_error() {
        let err = FeedError::Timeout(10);
        assert_eq!(err.to_string(), "Request timed out after 10 seconds");
    }

    #[test]
    fn test_error_from_serde() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let err: FeedError = result.unwrap_err().into();
        assert!(matches!(err, FeedError::Decode(_)));
        assert!(err.is_decode());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_classification_is_disjoint() {
        let errors = vec![
            FeedError::Network("reset".to_string()),
            FeedError::Timeout(10),
            FeedError::UnexpectedDocument("Feature".to_string()),
            FeedError::InvalidUrl("::".to_string()),
            FeedError::InvalidFilter("radius".to_string()),
        ];
        for err in errors {
            let groups = [err.is_transport(), err.is_decode(), err.is_configuration()];
            assert_eq!(groups.iter().filter(|g| **g).count(), 1, "{err:?}");
        }
    }

    #[test]
    fn test_user_message_unknown_feed_type() {
        let msg = FeedError::UnknownFeedType("x".to_string()).user_message();
        assert!(msg.contains("geofeed feed-types"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(FeedError::Network("timeout".to_string()).is_retryable());
        assert!(FeedError::Timeout(30).is_retryable());
        assert!(!FeedError::UnknownFeedType("bad".to_string()).is_retryable());
        assert!(!FeedError::Config("bad".to_string()).is_retryable());
    }
}
