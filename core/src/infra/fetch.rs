//! HTTP fetcher for build definitions referenced by URL.

use std::time::Duration;

use crate::application::ports::BuildFetcher;
use crate::domain::error::BuildInputError;

/// Fetches build definitions over HTTP(S) with a bounded timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl BuildFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, BuildInputError> {
        let fetch_err = |reason: String| BuildInputError::Fetch {
            url: url.to_string(),
            reason,
        };
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(fetch_err(format!("server returned {}", resp.status())));
        }
        let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
