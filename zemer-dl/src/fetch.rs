//! Outbound HTTP fetches
//!
//! One client, two timeouts: short for the song page, long for the binary
//! audio assets. Every fetch is one-shot; retry behavior belongs to the
//! caller's skip-and-continue handling, and there is none for the page.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;
use zemer_common::config::FetchConfig;
use zemer_common::{Error, Result};

/// Source of per-recording binary payloads. Split from the concrete client
/// so archive assembly can be exercised without a network.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch_asset(&self, url: &str) -> Result<Bytes>;
}

/// HTTP fetcher for the song page and its audio assets
pub struct Fetcher {
    client: reqwest::Client,
    page_timeout: Duration,
    asset_timeout: Duration,
}

impl Fetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            page_timeout: Duration::from_secs(config.page_timeout_secs),
            asset_timeout: Duration::from_secs(config.asset_timeout_secs),
        })
    }

    /// Fetch the song page HTML. Failure here is fatal for the request.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Fetching page {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.page_timeout)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("page request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "page request returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| Error::Upstream(format!("page body unreadable: {e}")))
    }
}

#[async_trait]
impl AssetSource for Fetcher {
    /// Fetch one audio asset as raw bytes. Failure here is recoverable: the
    /// caller logs, skips the recording and continues.
    async fn fetch_asset(&self, url: &str) -> Result<Bytes> {
        debug!("Fetching asset {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.asset_timeout)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("asset request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "asset request returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("asset body unreadable: {e}")))
    }
}
