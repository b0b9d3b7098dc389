use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP client for the monitoring backend's JSON endpoints.
///
/// Every failure mode (connection refused, timeout, non-2xx status,
/// malformed body) is caught here, logged, and collapsed to `None`.
/// Consumers treat "no data yet" and "fetch failed" identically: the
/// affected section degrades to its empty state while the rest of the
/// page keeps updating.
pub struct DataFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl DataFetcher {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = format!("{}{}", self.base_url, path);
        match self.try_fetch(&url).await {
            Ok(value) => {
                debug!("Fetched {}", url);
                Some(value)
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", url, e);
                None
            }
        }
    }

    async fn try_fetch<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json().await?)
    }
}
