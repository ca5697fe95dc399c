//! # Dual Logger
//!
//! An in-process logging facility with two audiences:
//!
//! * **Ops** messages for the people monitoring a service. Always delivered.
//! * **Dev** messages for developers, grouped by a named context (`"DB"`,
//!   `"NET"`, ...) and delivered only while that context is enabled.
//!
//! Entries go to a colorized console and/or a log file that rotates at
//! local midnight (`{prefix}-{YYYYMMDD}.log`). Producers only enqueue; a
//! single dispatch thread renders and writes, syncs the file every second
//! and polls the JSON config file every ten seconds.
//!
//! ## Main Components
//!
//! * [`Logger`]: producer handle and owner of the dispatch thread
//! * [`config`]: `LogConfig` and the hot-reloaded config store
//! * [`entry`]: pooled log entries
//! * [`rotation`]: the daily log file
//! * [`bridge`]: adapter for the `log` facade
//!
//! ## Quick Start
//!
//! ```
//! use dual_logger::{for_dev, for_ops, LogConfig, Logger};
//!
//! let logger = Logger::builder()
//!     .config(LogConfig::default())
//!     .console_writer(std::io::sink())
//!     .build()
//!     .unwrap();
//!
//! for_ops!(logger, "service started on port {}", 8080);
//! for_dev!(logger, "DB", "user {} logged in", "alice");
//! logger.shutdown();
//! ```
//!
//! ## Config file
//!
//! ```json
//! {
//!   "console": true,
//!   "filename": "/var/log/service/app",
//!   "log-all-dev": false,
//!   "dev-contexts": { "DB": true }
//! }
//! ```

use std::fmt;
use std::path::Path;

use lazy_static::lazy_static;

use crate::console::Console;

pub mod bridge;
pub mod clock;
pub mod config;
pub mod console;
pub mod entry;
pub mod error;
pub mod logger;
pub mod render;
pub mod rotation;

mod dispatch;

pub use bridge::LogBridge;
pub use config::{LogConfig, ReloadOutcome};
pub use dispatch::{CONFIG_CHECK_INTERVAL, FILE_SYNC_INTERVAL};
pub use entry::{EntryKind, LogEntry, PoolStats};
pub use error::LogError;
pub use logger::{Logger, LoggerBuilder, SINK_CAPACITY};

lazy_static! {
    /// Process-wide logger with the built-in config, writing to stdout.
    static ref DEFAULT_LOGGER: Logger = Logger::builder().build().unwrap_or_else(|err| {
        tracing::error!(error = %err, "default logger not started");
        let console = Console::stdout();
        console.banner(format_args!("Failed to start the default logger: {err}"));
        Logger::disconnected(console)
    });
}

/// The process-wide logger behind the free functions of this crate.
///
/// Started on first use with console-only output and the built-in config.
pub fn default_logger() -> &'static Logger {
    &DEFAULT_LOGGER
}

/// Configures the process-wide logger. See [`Logger::configure`].
pub fn configure(
    config_path: Option<&Path>,
    file_name_override: Option<&str>,
) -> Result<(), LogError> {
    DEFAULT_LOGGER.configure(config_path, file_name_override)
}

/// Logs a Dev entry through the process-wide logger.
#[track_caller]
pub fn for_dev(context: &str, message: &str, args: &[&dyn fmt::Display]) {
    DEFAULT_LOGGER.for_dev(context, message, args);
}

/// Logs an Ops entry through the process-wide logger.
pub fn for_ops(message: &str, args: &[&dyn fmt::Display]) {
    DEFAULT_LOGGER.for_ops(message, args);
}
