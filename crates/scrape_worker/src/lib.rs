//! Scrape worker: configuration, logging setup and the poll loop.
pub mod config;
pub mod logging;
pub mod poll_loop;

pub use config::{Cli, ConfigError, WorkerConfig};
pub use poll_loop::{setup_signal_handler, Iteration, PollLoop, ShutdownSignal};
