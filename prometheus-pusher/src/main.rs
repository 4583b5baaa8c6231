//! Prometheus pusher.
//!
//! Scrapes the configured exporters and pushes their metrics to a
//! Pushgateway until stopped.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use pusher_framework::{PusherArgs, Runner};

use prometheus_pusher::{PushMode, RunContext, Scheduler, config, instance};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = PusherArgs::parse();

    let mut runner = Runner::new_with_args("prometheus-pusher", &args)?;

    let instance = instance::resolve(args.instance.as_deref());
    let mode = if args.dummy {
        PushMode::Dummy
    } else {
        PushMode::Gateway
    };
    let ctx = Arc::new(RunContext::new(&instance, mode).context("Failed to build HTTP client")?);

    let config = config::load(&args.config)
        .with_context(|| format!("Error parsing configuration {}", args.config.display()))?;

    tracing::info!(
        config = %args.config.display(),
        targets = config.targets.len(),
        gateway = %config.push.gateway_url,
        interval_secs = config.push.push_interval.as_secs(),
        instance = %instance,
        dummy = args.dummy,
        "Configuration loaded"
    );
    if config.targets.is_empty() {
        tracing::warn!(config = %args.config.display(), "No targets configured");
    }

    let scheduler = Scheduler::new(args.config.clone(), ctx);

    if args.once {
        let report = scheduler.fan_out(&config).wait().await?;
        for name in &report.failed {
            tracing::error!(target_name = %name, "Target failed");
        }
        return Ok(if report.is_success() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    runner.spawn(scheduler.run(config));
    runner.run().await?;

    Ok(ExitCode::SUCCESS)
}
