//! Process-wide, read-only state shared by every cycle.

use std::time::Duration;

use crate::fetch::Fetcher;
use crate::push::{PushMode, Pusher};

/// Timeout applied to every scrape and push request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable context built once at startup and handed to every cycle.
#[derive(Debug, Clone)]
pub struct RunContext {
    instance: String,
    fetcher: Fetcher,
    pusher: Pusher,
}

impl RunContext {
    /// Build a context with the default request timeout.
    pub fn new(instance: impl Into<String>, mode: PushMode) -> Result<Self, reqwest::Error> {
        Self::with_timeout(instance, mode, DEFAULT_HTTP_TIMEOUT)
    }

    /// Build a context whose requests time out after `timeout`.
    pub fn with_timeout(
        instance: impl Into<String>,
        mode: PushMode,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .user_agent(concat!("prometheus-pusher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            instance: instance.into(),
            fetcher: Fetcher::new(client.clone()),
            pusher: Pusher::new(client, mode),
        })
    }

    /// Instance identity reported to the gateway.
    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn pusher(&self) -> &Pusher {
        &self.pusher
    }
}
