//! Error types for archive client operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response other than a not-found group
    #[error("HTTP {status} {reason} for {url}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase, empty when unknown
        reason: String,
        /// Requested URL
        url: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ProtocolError {
    /// Check if error is retryable
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Json(_) | Self::InvalidUrl(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ProtocolError {
        ProtocolError::HttpStatus {
            status: code,
            reason: String::new(),
            url: "http://localhost/caches.json".to_string(),
        }
    }

    #[test]
    fn test_should_retry() {
        assert!(status(503).should_retry());
        assert!(status(429).should_retry());
        assert!(!status(403).should_retry());
        assert!(!ProtocolError::InvalidUrl(url::ParseError::EmptyHost).should_retry());
    }

    #[test]
    fn test_status_display() {
        let err = ProtocolError::HttpStatus {
            status: 500,
            reason: "Internal Server Error".to_string(),
            url: "http://localhost/x".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 500 Internal Server Error for http://localhost/x"
        );
    }
}
