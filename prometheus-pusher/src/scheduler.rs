//! Interval-driven collection cycles.
//!
//! On startup every target is collected once, right away. After that, each
//! tick reloads the configuration from disk and starts one independent
//! fetch → repair → push task per target. A tick whose reload fails does
//! nothing; the next tick tries again.
//!
//! The loop never waits for a tick's tasks. They run in a per-tick
//! [`JoinSet`] owned by a detached supervisor that logs a summary once all of
//! them are done, so slow targets can overlap with later ticks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::config::{self, ConfigError, PusherConfig, TargetConfig};
use crate::context::RunContext;
use crate::error::CycleError;
use crate::repair;

/// Outcome of one tick's fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Targets successfully pushed.
    pub pushed: Vec<String>,
    /// Targets whose fetch or push failed.
    pub failed: Vec<String>,
}

impl TickReport {
    /// Number of targets started in the tick.
    pub fn targets(&self) -> usize {
        self.pushed.len() + self.failed.len()
    }

    /// True when every target was pushed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Handle on a tick's task group.
///
/// Dropping it detaches the group; its tasks keep running.
#[derive(Debug)]
pub struct TickHandle {
    push_interval: Duration,
    supervisor: JoinHandle<TickReport>,
}

impl TickHandle {
    /// Push interval of the configuration this tick ran with.
    pub fn push_interval(&self) -> Duration {
        self.push_interval
    }

    /// Wait for every target of the tick to finish.
    pub async fn wait(self) -> Result<TickReport, JoinError> {
        self.supervisor.await
    }
}

/// Drives collection cycles for one configuration path.
pub struct Scheduler {
    config_path: PathBuf,
    ctx: Arc<RunContext>,
}

impl Scheduler {
    /// Create a scheduler reloading its targets from `config_path`.
    pub fn new(config_path: impl Into<PathBuf>, ctx: Arc<RunContext>) -> Self {
        Self {
            config_path: config_path.into(),
            ctx,
        }
    }

    /// Run forever: collect `initial` right away, then tick on the push
    /// interval.
    ///
    /// The timer is re-armed when a reload changes the push interval. A tick
    /// whose reload fails keeps the current period.
    pub async fn run(self, initial: PusherConfig) {
        let mut period = initial.push.push_interval;

        tracing::info!(
            targets = initial.targets.len(),
            interval_secs = period.as_secs(),
            "Starting initial collection"
        );
        self.fan_out(&initial);

        let mut ticker = period_timer(period);

        loop {
            ticker.tick().await;

            match self.tick().await {
                Ok(handle) => {
                    let next = handle.push_interval();
                    if next != period {
                        tracing::info!(
                            old_secs = period.as_secs(),
                            new_secs = next.as_secs(),
                            "Push interval changed"
                        );
                        period = next;
                        ticker = period_timer(period);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        path = %self.config_path.display(),
                        error = %e,
                        "Error parsing configuration, skipping this cycle"
                    );
                }
            }
        }
    }

    /// Reload the configuration and start a cycle for every target.
    ///
    /// Nothing is started when the reload fails. Files are read on the
    /// blocking pool.
    pub async fn tick(&self) -> Result<TickHandle, ConfigError> {
        let path = self.config_path.clone();
        let config = tokio::task::spawn_blocking(move || config::load(path))
            .await
            .map_err(|e| ConfigError::Unreadable {
                path: self.config_path.clone(),
                source: std::io::Error::other(e),
            })??;
        tracing::debug!(
            path = %self.config_path.display(),
            targets = config.targets.len(),
            "Configuration reloaded"
        );
        Ok(self.fan_out(&config))
    }

    /// Start one independent cycle per target of `config`.
    pub fn fan_out(&self, config: &PusherConfig) -> TickHandle {
        let mut cycles = JoinSet::new();

        for target in &config.targets {
            let ctx = self.ctx.clone();
            let target = target.clone();
            let gateway_url = config.push.gateway_url.clone();

            cycles.spawn(async move {
                let result = run_cycle(&ctx, &gateway_url, &target).await;
                if let Err(ref e) = result {
                    tracing::error!(
                        target_name = %target.name,
                        url = %target.url,
                        error = %e,
                        "Collection cycle failed"
                    );
                }
                (target.name, result.is_ok())
            });
        }

        TickHandle {
            push_interval: config.push.push_interval,
            supervisor: tokio::spawn(supervise(cycles)),
        }
    }
}

/// Fetch, repair and push a single target.
///
/// Returns the number of bytes pushed.
pub async fn run_cycle(
    ctx: &RunContext,
    gateway_url: &str,
    target: &TargetConfig,
) -> Result<usize, CycleError> {
    let payload = ctx.fetcher().fetch(target).await?;
    let repaired = repair::add_timestamps(&payload);
    let bytes = repaired.len();

    ctx.pusher()
        .push(gateway_url, &target.name, ctx.instance(), repaired)
        .await?;

    Ok(bytes)
}

async fn supervise(mut cycles: JoinSet<(String, bool)>) -> TickReport {
    let started = Instant::now();
    let mut report = TickReport::default();

    while let Some(joined) = cycles.join_next().await {
        match joined {
            Ok((name, true)) => report.pushed.push(name),
            Ok((name, false)) => report.failed.push(name),
            Err(e) => tracing::error!(error = %e, "Collection task did not complete"),
        }
    }

    report.pushed.sort();
    report.failed.sort();

    tracing::info!(
        targets = report.targets(),
        pushed = report.pushed.len(),
        failed = report.failed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Collection cycle complete"
    );

    report
}

/// Timer firing every `period`, first one period from now.
///
/// Periods above [`config::MAX_PUSH_INTERVAL`] are clamped.
fn period_timer(period: Duration) -> tokio::time::Interval {
    let period = period.min(config::MAX_PUSH_INTERVAL);
    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or(now);

    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
