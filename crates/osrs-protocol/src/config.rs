//! Configuration for the archive client

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Public OpenRS2 archive
pub const DEFAULT_BASE_URL: &str = "https://archive.openrs2.org";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Archive base URL
    pub base_url: String,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Request timeout; the flat export of a full cache can take a while
    pub request_timeout: Duration,

    /// User agent sent with every request
    pub user_agent: String,

    /// Retry policy for failed requests
    pub retry_policy: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            user_agent: concat!("osrs-protocol/", env!("CARGO_PKG_VERSION")).to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("OSRS_ARCHIVE_URL").unwrap_or(defaults.base_url),
            connect_timeout: Duration::from_secs(
                std::env::var("OSRS_CONNECT_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            request_timeout: Duration::from_secs(
                std::env::var("OSRS_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            user_agent: defaults.user_agent,
            retry_policy: RetryPolicy::from_env(),
        }
    }

    /// Point the client at another archive
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://archive.openrs2.org");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("osrs-protocol/"));
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_base_url("http://localhost:8080")
            .with_retry_policy(RetryPolicy::none());
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.retry_policy.max_attempts, 0);
    }
}
