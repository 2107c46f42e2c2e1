//! Error types for the Comtrade and forecast service boundaries

use tde_utils::error::PeriodError;
use thiserror::Error;

/// Longest slice of a response body kept in an error message.
pub const BODY_EXCERPT_LEN: usize = 200;

/// Main error type for trade data operations
#[derive(Error, Debug)]
pub enum ComtradeError {
    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Upstream answered with something other than JSON
    #[error("Expected JSON but got {content_type}. Response: {body}")]
    ContentType { content_type: String, body: String },

    /// Failed to decode a JSON payload
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Payload decoded but does not have the agreed shape
    #[error("Unexpected response shape: {0}")]
    Contract(String),

    /// Malformed period bound or token
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// Query rejected before any request was made
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Catalog type other than reporters or partners
    #[error("Invalid catalog type: {0}")]
    UnknownCatalog(String),
}

/// Type alias for Results using ComtradeError
pub type Result<T> = std::result::Result<T, ComtradeError>;

/// First [`BODY_EXCERPT_LEN`] characters of a response body.
pub fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let body = "é".repeat(300);
        assert_eq!(excerpt(&body).chars().count(), BODY_EXCERPT_LEN);
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_status_message() {
        let err = ComtradeError::Status {
            service: "Comtrade API",
            status: 429,
            body: "Rate limit".to_string(),
        };
        assert_eq!(err.to_string(), "Comtrade API returned status 429: Rate limit");
    }
}
