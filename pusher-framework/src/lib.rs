//! Pusher Framework
//!
//! Process plumbing shared by metric pushers.
//!
//! # Overview
//!
//! This framework provides:
//! - [`PusherArgs`] for common CLI argument parsing
//! - [`LoggingConfig`] and [`init_tracing`] for `tracing` setup
//! - [`Runner`] for process lifecycle (task tracking, signal handling)
//!
//! # Example
//!
//! ```ignore
//! use pusher_framework::{PusherArgs, Runner};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = PusherArgs::parse();
//!     let mut runner = Runner::new_with_args("mypusher", &args)?;
//!
//!     runner.spawn(my_worker());
//!
//!     // Run until Ctrl+C
//!     runner.run().await?;
//!     Ok(())
//! }
//! ```

mod args;
mod error;
mod logging;
mod runner;

pub use args::{DEFAULT_CONFIG_PATH, PusherArgs};
pub use error::{FrameworkError, Result};
pub use logging::{LogFormat, LoggingConfig, init_tracing, level_for_verbosity};
pub use runner::Runner;
