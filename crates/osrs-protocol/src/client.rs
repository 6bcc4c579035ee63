//! OpenRS2 archive HTTP client

use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveId, IndexId};
use reqwest::{Client, StatusCode};
use std::sync::Once;
use tracing::debug;
use url::Url;

use crate::api::{ArchiveApi, CacheDescriptor, CacheSnapshot};
use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::retry::RetryPolicy;

static CRYPTO_PROVIDER: Once = Once::new();

/// Install the ring provider for rustls once per process
///
/// reqwest is built without a bundled provider. Installation fails only when
/// another provider is already installed, which is fine.
pub fn ensure_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// HTTP client for an OpenRS2-style cache archive
///
/// Endpoints:
/// - `/caches.json`
/// - `/caches/{scope}/{id}/archives/{index}/groups/{group}.dat`
/// - `/caches/{scope}/{id}/keys.json`
/// - `/caches/{scope}/{id}/flat.tar.gz`
#[derive(Debug, Clone)]
pub struct OpenRs2Client {
    client: Client,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl OpenRs2Client {
    /// Create a client from configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // Validate up front so bad configuration fails at construction
        let parsed = Url::parse(&config.base_url)?;

        ensure_crypto_provider();
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            retry_policy: config.retry_policy.clone(),
        })
    }

    /// Create a client with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ClientConfig::default())
    }

    /// Base URL requests are issued against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache_url(&self, snapshot: &CacheSnapshot, rest: &str) -> String {
        format!(
            "{}/caches/{}/{}/{}",
            self.base_url, snapshot.scope, snapshot.id, rest
        )
    }

    /// GET a URL, mapping 404 to `None` and every other non-success to an error
    async fn fetch(&self, url: &str) -> Result<Option<Bytes>> {
        self.retry_policy
            .execute(|| async move {
                debug!("GET {}", url);
                let response = self.client.get(url).send().await?;
                match response.status() {
                    status if status.is_success() => Ok(Some(response.bytes().await?)),
                    StatusCode::NOT_FOUND => Ok(None),
                    status => Err(ProtocolError::HttpStatus {
                        status: status.as_u16(),
                        reason: status.canonical_reason().unwrap_or_default().to_string(),
                        url: url.to_string(),
                    }),
                }
            })
            .await
    }

    /// GET a URL where not-found is as fatal as any other failure
    async fn fetch_required(&self, url: &str) -> Result<Bytes> {
        self.fetch(url)
            .await?
            .ok_or_else(|| ProtocolError::HttpStatus {
                status: StatusCode::NOT_FOUND.as_u16(),
                reason: "Not Found".to_string(),
                url: url.to_string(),
            })
    }
}

#[async_trait]
impl ArchiveApi for OpenRs2Client {
    async fn list_caches(&self) -> Result<Vec<CacheDescriptor>> {
        let url = format!("{}/caches.json", self.base_url);
        let body = self.fetch_required(&url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn group(
        &self,
        snapshot: &CacheSnapshot,
        index: IndexId,
        group: ArchiveId,
    ) -> Result<Option<Bytes>> {
        let url = self.cache_url(snapshot, &format!("archives/{index}/groups/{group}.dat"));
        self.fetch(&url).await
    }

    async fn keys(&self, snapshot: &CacheSnapshot) -> Result<Bytes> {
        let url = self.cache_url(snapshot, "keys.json");
        self.fetch_required(&url).await
    }

    async fn flat_export(&self, snapshot: &CacheSnapshot) -> Result<Bytes> {
        let url = self.cache_url(snapshot, "flat.tar.gz");
        self.fetch_required(&url).await
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base_url() {
        let config = ClientConfig::default().with_base_url("not a url");
        assert!(matches!(
            OpenRs2Client::new(&config),
            Err(ProtocolError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_cache_url_layout() {
        let config = ClientConfig::default().with_base_url("https://archive.openrs2.org/");
        let client = OpenRs2Client::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://archive.openrs2.org");
        assert_eq!(
            client.cache_url(&CacheSnapshot::osrs(1812), "keys.json"),
            "https://archive.openrs2.org/caches/runescape/1812/keys.json"
        );
    }
}
