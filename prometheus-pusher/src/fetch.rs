//! Scraping of a target's metrics endpoint.

use crate::config::TargetConfig;
use crate::error::FetchError;

/// Issues scrape requests.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher on top of `client`, whose timeout bounds each request.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GET the target's metrics and return the full body.
    ///
    /// A non-success status is logged but still yields the body.
    pub async fn fetch(&self, target: &TargetConfig) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(target_name = %target.name, url = %target.url, "Getting metrics");

        let response = self
            .client
            .get(&target.url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                target: target.name.clone(),
                url: target.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                target_name = %target.name,
                url = %target.url,
                status = %status,
                "Exporter answered with a non-success status"
            );
        }

        let body = response.bytes().await.map_err(|source| FetchError::Body {
            target: target.name.clone(),
            url: target.url.clone(),
            source,
        })?;

        tracing::trace!(target_name = %target.name, bytes = body.len(), "Got metrics");

        Ok(body.to_vec())
    }
}
