//! Delivery of metrics to a Pushgateway.

use std::io::Write;

use reqwest::Url;
use reqwest::header::CONTENT_TYPE;

use crate::error::PushError;

/// Longest gateway error body kept in a [`PushError::Rejected`].
const MAX_ERROR_BODY: usize = 512;

/// Where pushed payloads go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PushMode {
    /// POST to the gateway.
    #[default]
    Gateway,
    /// Print to stdout, no network traffic.
    Dummy,
}

/// Pushes payloads to the gateway, or to stdout in dummy mode.
#[derive(Debug, Clone)]
pub struct Pusher {
    client: reqwest::Client,
    mode: PushMode,
}

impl Pusher {
    /// Create a pusher on top of `client`, whose timeout bounds each request.
    pub fn new(client: reqwest::Client, mode: PushMode) -> Self {
        Self { client, mode }
    }

    /// Push `payload` as job `job`, instance `instance`.
    pub async fn push(
        &self,
        gateway_url: &str,
        job: &str,
        instance: &str,
        payload: Vec<u8>,
    ) -> Result<(), PushError> {
        match self.mode {
            PushMode::Dummy => print_payload(payload).await,
            PushMode::Gateway => self.post(gateway_url, job, instance, payload).await,
        }
    }

    async fn post(
        &self,
        gateway_url: &str,
        job: &str,
        instance: &str,
        payload: Vec<u8>,
    ) -> Result<(), PushError> {
        let url = push_url(gateway_url, job, instance)?;

        tracing::debug!(
            endpoint_url = %url,
            target_name = %job,
            bytes = payload.len(),
            "Pushing metrics"
        );

        let response = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(payload)
            .send()
            .await
            .map_err(|source| PushError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut end = MAX_ERROR_BODY;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            body.truncate(end);
        }

        Err(PushError::Rejected {
            url: url.to_string(),
            status,
            body: body.trim().to_string(),
        })
    }
}

/// Compose `<gateway>/metrics/job/<job>/instance/<instance>`.
///
/// Segments are percent-encoded; a trailing `/` on the gateway URL is
/// tolerated.
pub fn push_url(gateway_url: &str, job: &str, instance: &str) -> Result<Url, PushError> {
    let invalid = |message: String| PushError::InvalidUrl {
        gateway: gateway_url.to_string(),
        message,
    };

    let mut url = Url::parse(gateway_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("URL cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["metrics", "job", job, "instance", instance]);

    Ok(url)
}

/// Write `payload` and a newline to stdout on the blocking pool.
///
/// The stdout lock is held for the whole payload so concurrent targets do
/// not interleave.
async fn print_payload(payload: Vec<u8>) -> Result<(), PushError> {
    tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        out.write_all(&payload)?;
        out.write_all(b"\n")?;
        out.flush()
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_url() {
        let url = push_url("http://localhost:9091", "node", "host01").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9091/metrics/job/node/instance/host01"
        );
    }

    #[test]
    fn test_push_url_trailing_slash() {
        let url = push_url("http://gw:9091/", "node", "host01").unwrap();
        assert_eq!(url.as_str(), "http://gw:9091/metrics/job/node/instance/host01");
    }

    #[test]
    fn test_push_url_keeps_base_path() {
        let url = push_url("https://gw.example.com/pushgateway", "app", "h").unwrap();
        assert_eq!(
            url.as_str(),
            "https://gw.example.com/pushgateway/metrics/job/app/instance/h"
        );
    }

    #[test]
    fn test_push_url_encodes_segments() {
        let url = push_url("http://gw:9091", "my job", "a/b").unwrap();
        assert_eq!(
            url.as_str(),
            "http://gw:9091/metrics/job/my%20job/instance/a%2Fb"
        );
    }

    #[test]
    fn test_push_url_invalid_gateway() {
        assert!(matches!(
            push_url("gateway:9091:x", "job", "i"),
            Err(PushError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_dummy_mode_skips_network() {
        // Nothing listens on this gateway; dummy mode must not try it.
        let pusher = Pusher::new(reqwest::Client::new(), PushMode::Dummy);
        pusher
            .push("http://127.0.0.1:1", "job", "instance", b"up 1 1\n".to_vec())
            .await
            .unwrap();
    }
}
