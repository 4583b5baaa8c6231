//! Process runner for lifecycle management.

use std::future::Future;

use tokio::signal;
use tokio::task::JoinHandle;

use crate::args::PusherArgs;
use crate::error::{FrameworkError, Result};
use crate::logging::init_tracing;

/// Runner that owns the lifetime of a pusher process.
///
/// Handles:
/// - Logging initialization
/// - Task spawning and tracking
/// - Shutdown on Ctrl+C or SIGTERM
///
/// Shutdown aborts tracked tasks; in-flight work is not drained.
pub struct Runner {
    /// Process name for logging.
    name: String,
    /// Process version.
    version: String,
    /// Spawned tasks.
    tasks: Vec<JoinHandle<()>>,
}

impl Runner {
    /// Create a runner without touching the global logger.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tasks: Vec::new(),
        }
    }

    /// Create a runner and initialize logging from CLI arguments.
    pub fn new_with_args(name: impl Into<String>, args: &PusherArgs) -> Result<Self> {
        let runner = Self::new(name);

        init_tracing(&args.logging())?;

        tracing::info!(name = %runner.name, version = %runner.version, "Starting");

        Ok(runner)
    }

    /// Spawn a worker task.
    ///
    /// The task is tracked and aborted on shutdown.
    pub fn spawn<F>(&mut self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(future));
    }

    /// Run until Ctrl+C or SIGTERM, then abort all tracked tasks.
    pub async fn run(self) -> Result<()> {
        tracing::info!(
            name = %self.name,
            tasks = self.tasks.len(),
            "Running. Press Ctrl+C to stop."
        );

        self.run_until(shutdown_signal()).await
    }

    /// Run until `shutdown` resolves, then abort all tracked tasks.
    pub async fn run_until<S>(self, shutdown: S) -> Result<()>
    where
        S: Future<Output = Result<()>>,
    {
        let outcome = shutdown.await;

        tracing::info!(name = %self.name, "Shutting down");

        for task in &self.tasks {
            task.abort();
        }

        outcome
    }
}

/// Resolve on the first of Ctrl+C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(
        |source| FrameworkError::Signal {
            signal: "SIGTERM",
            source,
        },
    )?;

    tokio::select! {
        result = signal::ctrl_c() => {
            result.map_err(|source| FrameworkError::Signal { signal: "Ctrl+C", source })?;
            tracing::info!("Received Ctrl+C");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
    }

    Ok(())
}

/// Resolve on Ctrl+C.
#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    signal::ctrl_c()
        .await
        .map_err(|source| FrameworkError::Signal {
            signal: "Ctrl+C",
            source,
        })?;
    tracing::info!("Received Ctrl+C");
    Ok(())
}
