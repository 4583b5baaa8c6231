//! Scrape Prometheus exporters and forward their metrics to a Pushgateway.
//!
//! Many small services expose a `/metrics` endpoint but cannot push. This
//! crate collects each of them on an interval, stamps samples that carry no
//! timestamp with the collection time, and pushes the result to a
//! Pushgateway as job `<target name>`, instance `<local host>`.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!                 │  Scheduler   │── reload ──> config::load
//!                 └──────┬───────┘
//!          one task per target per tick
//!      ┌─────────────────┼─────────────────┐
//!      v                 v                 v
//!  Fetcher ──> repair ──> Pusher ──> Pushgateway
//! ```
//!
//! # Usage
//!
//! ```bash
//! prometheus-pusher --config /etc/prometheus-pusher/conf.d
//! ```
//!
//! See [`config`] for the configuration format.

pub mod config;
pub mod context;
pub mod error;
pub mod fetch;
pub mod instance;
pub mod push;
pub mod repair;
pub mod scheduler;

pub use config::{ConfigError, PushConfig, PusherConfig, TargetConfig};
pub use context::RunContext;
pub use error::{CycleError, FetchError, PushError};
pub use fetch::Fetcher;
pub use push::{PushMode, Pusher};
pub use repair::{add_timestamps, repair};
pub use scheduler::{Scheduler, TickHandle, TickReport};
