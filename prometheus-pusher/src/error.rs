//! Errors of a single fetch → repair → push cycle.

use thiserror::Error;

/// Failure to scrape a target.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to get metrics for '{target}' from {url}: {source}")]
    Request {
        target: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read response body for '{target}' from {url}: {source}")]
    Body {
        target: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to deliver metrics to the gateway.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Invalid push URL for gateway '{gateway}': {message}")]
    InvalidUrl { gateway: String, message: String },

    #[error("Failed to push metrics to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Pushgateway rejected metrics at {url}: {status}: {body}")]
    Rejected {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to write metrics to stdout: {0}")]
    Console(#[from] std::io::Error),
}

/// Failure of one target's cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Push(#[from] PushError),
}
