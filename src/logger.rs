use std::fmt;
use std::io::Write;
use std::panic::Location;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigStore, LogConfig, ReloadOutcome};
use crate::console::Console;
use crate::dispatch::{Dispatcher, CONFIG_CHECK_INTERVAL, FILE_SYNC_INTERVAL};
use crate::entry::{EntryKind, EntryPool, LogEntry, PoolStats, DEFAULT_MAX_IDLE};
use crate::error::LogError;
use crate::rotation::RotatingFile;

/// Pending entries each sink queue holds before producers block.
pub const SINK_CAPACITY: usize = 100;

/// Where a Dev entry was logged from, rendered as `file:line`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Source<'a> {
    pub(crate) file: &'a str,
    pub(crate) line: u32,
}

impl<'a> From<&'a Location<'a>> for Source<'a> {
    fn from(location: &'a Location<'a>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Builder for a [`Logger`]. Every knob has a production default.
pub struct LoggerBuilder {
    config: LogConfig,
    console: Option<Box<dyn Write + Send>>,
    clock: Arc<dyn Clock>,
    config_check_interval: Duration,
    file_sync_interval: Duration,
    sink_capacity: usize,
    max_idle_entries: usize,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            config: LogConfig::default(),
            console: None,
            clock: Arc::new(SystemClock),
            config_check_interval: CONFIG_CHECK_INTERVAL,
            file_sync_interval: FILE_SYNC_INTERVAL,
            sink_capacity: SINK_CAPACITY,
            max_idle_entries: DEFAULT_MAX_IDLE,
        }
    }
}

impl LoggerBuilder {
    /// Configuration active until a config file is loaded.
    pub fn config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Console stream; stdout when not set.
    pub fn console_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.console = Some(Box::new(writer));
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config_check_interval(mut self, interval: Duration) -> Self {
        self.config_check_interval = interval;
        self
    }

    pub fn file_sync_interval(mut self, interval: Duration) -> Self {
        self.file_sync_interval = interval;
        self
    }

    pub fn sink_capacity(mut self, capacity: usize) -> Self {
        self.sink_capacity = capacity;
        self
    }

    pub fn max_idle_entries(mut self, max_idle: usize) -> Self {
        self.max_idle_entries = max_idle;
        self
    }

    /// Creates the sink queues and starts the dispatch thread.
    pub fn build(self) -> Result<Logger, LogError> {
        let console = match self.console {
            Some(writer) => Console::new(writer),
            None => Console::stdout(),
        };
        console.banner(format_args!("Init Logger"));

        let config = Arc::new(ConfigStore::new(self.config, console.clone()));
        let pool = Arc::new(EntryPool::new(self.max_idle_entries));
        let (console_tx, console_rx) = bounded(self.sink_capacity);
        let (file_tx, file_rx) = bounded(self.sink_capacity);
        let (shutdown_tx, shutdown_rx) = bounded(0);

        let dispatcher = Dispatcher {
            console_rx,
            file_rx,
            shutdown_rx,
            pool: Arc::clone(&pool),
            config: Arc::clone(&config),
            console: console.clone(),
            clock: self.clock,
            config_check_interval: self.config_check_interval,
            file_sync_interval: self.file_sync_interval,
            file: RotatingFile::new(),
            line: String::with_capacity(256),
        };
        let handle = thread::Builder::new()
            .name("log-dispatch".into())
            .spawn(move || dispatcher.run())
            .map_err(LogError::Spawn)?;

        Ok(Logger {
            inner: Arc::new(Inner {
                config,
                pool,
                console,
                console_tx,
                file_tx,
                file_sink: AtomicBool::new(false),
                configured: AtomicBool::new(false),
                shutdown_tx: Mutex::new(Some(shutdown_tx)),
                dispatcher: Mutex::new(Some(handle)),
            }),
        })
    }
}

struct Inner {
    config: Arc<ConfigStore>,
    pool: Arc<EntryPool>,
    console: Console,
    console_tx: Sender<Box<LogEntry>>,
    file_tx: Sender<Box<LogEntry>>,
    file_sink: AtomicBool,
    configured: AtomicBool,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to one logging pipeline: two sink queues drained by a dedicated
/// dispatch thread.
///
/// Cloning is cheap and every clone feeds the same pipeline. Producers never
/// see an error: entries that cannot be delivered are dropped. A full sink
/// queue blocks the producer until the dispatch thread catches up.
///
/// The dispatch thread runs until [`Logger::shutdown`] is called or the last
/// handle is dropped.
///
/// # Examples
///
/// ```
/// use dual_logger::{for_dev, for_ops, Logger};
///
/// let logger = Logger::builder().console_writer(std::io::sink()).build().unwrap();
/// for_ops!(logger, "service started");
/// for_dev!(logger, "DB", "user {} logged in", "alice");
/// logger.shutdown();
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// A logger without a dispatch thread. Both sink queues are already
    /// disconnected, so every entry goes straight back to the pool.
    pub(crate) fn disconnected(console: Console) -> Self {
        let (console_tx, _) = bounded(0);
        let (file_tx, _) = bounded(0);
        Logger {
            inner: Arc::new(Inner {
                config: Arc::new(ConfigStore::new(LogConfig::default(), console.clone())),
                pool: Arc::new(EntryPool::new(DEFAULT_MAX_IDLE)),
                console,
                console_tx,
                file_tx,
                file_sink: AtomicBool::new(false),
                configured: AtomicBool::new(false),
                shutdown_tx: Mutex::new(None),
                dispatcher: Mutex::new(None),
            }),
        }
    }

    /// One-time setup: watches `config_path`, enables the file sink and
    /// loads the config synchronously.
    ///
    /// A config file that cannot be read or decoded is reported on the
    /// console and the current config stays in effect. A non-empty
    /// `file_name_override` replaces the configured file prefix, including
    /// on every later reload.
    pub fn configure(
        &self,
        config_path: Option<&Path>,
        file_name_override: Option<&str>,
    ) -> Result<(), LogError> {
        if self.inner.configured.swap(true, Ordering::AcqRel) {
            return Err(LogError::AlreadyConfigured);
        }
        let path = config_path
            .filter(|path| !path.as_os_str().is_empty())
            .map(Path::to_path_buf);
        let prefix_override = file_name_override
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_owned);

        self.inner.config.watch(path, prefix_override);
        self.inner.file_sink.store(true, Ordering::Release);
        self.inner.config.load_config();
        Ok(())
    }

    /// Logs a developer message under `context`.
    ///
    /// Dropped without side effects unless the context is enabled. The
    /// caller's `file:line` is recorded as the entry's source.
    #[track_caller]
    pub fn for_dev(&self, context: &str, message: &str, args: &[&dyn fmt::Display]) {
        let caller = Location::caller();
        self.submit(EntryKind::Dev, context, Some(caller.into()), message, args);
    }

    /// Logs an operational message. Always delivered to the enabled sinks.
    pub fn for_ops(&self, message: &str, args: &[&dyn fmt::Display]) {
        self.submit(EntryKind::Ops, "", None, message, args);
    }

    pub(crate) fn submit(
        &self,
        kind: EntryKind,
        context: &str,
        source: Option<Source<'_>>,
        message: &str,
        args: &[&dyn fmt::Display],
    ) {
        let (to_console, to_file) = {
            let config = self.inner.config.load();
            if kind == EntryKind::Dev && !config.allows(context) {
                return;
            }
            let file_sink = self.inner.file_sink.load(Ordering::Acquire);
            (config.console_enabled, file_sink && config.file_enabled())
        };
        if !to_console && !to_file {
            return;
        }

        let pool = &self.inner.pool;
        let mut entry = pool.acquire();
        entry.fill(kind, context, message, args);
        if let Some(source) = source {
            entry.set_source(&source);
        }

        match (to_console, to_file) {
            (true, true) => {
                let mut copy = pool.acquire();
                copy.copy_from(&entry);
                self.enqueue(&self.inner.console_tx, entry);
                self.enqueue(&self.inner.file_tx, copy);
            }
            (true, false) => self.enqueue(&self.inner.console_tx, entry),
            _ => self.enqueue(&self.inner.file_tx, entry),
        }
    }

    /// Blocks while the queue is full; hands the entry back to the pool if
    /// the dispatch thread is gone.
    fn enqueue(&self, sink: &Sender<Box<LogEntry>>, entry: Box<LogEntry>) {
        if let Err(rejected) = sink.send(entry) {
            self.inner.pool.release(rejected.into_inner());
        }
    }

    /// The active configuration.
    pub fn config(&self) -> Arc<LogConfig> {
        self.inner.config.current()
    }

    /// Replaces the active configuration without touching the config file.
    pub fn set_config(&self, config: LogConfig) {
        self.inner.config.replace(config);
    }

    /// Re-reads the watched config file right away.
    pub fn reload_config(&self) -> ReloadOutcome {
        self.inner.config.load_config()
    }

    /// Reloads the watched config file if it changed since the last load.
    pub fn check_config_file(&self) -> ReloadOutcome {
        self.inner.config.check_config_file()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.inner.pool.stats()
    }

    /// Stops the dispatch thread after it has written everything already
    /// queued and synced the log file. Entries logged afterwards are
    /// dropped. Calling it again is a no-op.
    pub fn shutdown(&self) {
        drop(self.inner.shutdown_tx.lock().take());
        let handle = self.inner.dispatcher.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                self.inner
                    .console
                    .banner(format_args!("Log dispatch thread panicked"));
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.inner.config.current())
            .field("file_sink", &self.inner.file_sink.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Logs a developer message through a [`Logger`].
///
/// Arguments can be anything that implements `Display`; each `{}` in the
/// message is replaced by the next one. With no arguments the message is
/// written as-is.
///
/// ```
/// # use dual_logger::{for_dev, Logger};
/// # let logger = Logger::builder().console_writer(std::io::sink()).build().unwrap();
/// for_dev!(logger, "DB", "connection pool ready");
/// for_dev!(logger, "DB", "query {} took {}ms", "select_users", 12);
/// ```
#[macro_export]
macro_rules! for_dev {
    ($logger:expr, $context:expr, $message:expr $(,)?) => {
        $logger.for_dev($context, $message, &[])
    };
    ($logger:expr, $context:expr, $message:expr, $($arg:expr),+ $(,)?) => {
        $logger.for_dev(
            $context,
            $message,
            &[$(&$arg as &dyn ::std::fmt::Display),+],
        )
    };
}

/// Logs an operational message through a [`Logger`].
///
/// ```
/// # use dual_logger::{for_ops, Logger};
/// # let logger = Logger::builder().console_writer(std::io::sink()).build().unwrap();
/// for_ops!(logger, "listening on port {}", 8080);
/// ```
#[macro_export]
macro_rules! for_ops {
    ($logger:expr, $message:expr $(,)?) => {
        $logger.for_ops($message, &[])
    };
    ($logger:expr, $message:expr, $($arg:expr),+ $(,)?) => {
        $logger.for_ops($message, &[$(&$arg as &dyn ::std::fmt::Display),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnected_logger_recycles_every_entry() {
        let logger = Logger::disconnected(Console::new(Box::new(std::io::sink())));

        for i in 0..(SINK_CAPACITY * 3) {
            for_ops!(logger, "nowhere {}", i);
            for_dev!(logger, "DB", "nowhere {}", i);
        }
        logger.configure(None, Some("unused")).unwrap();
        for_ops!(logger, "still nowhere");
        logger.shutdown();

        let stats = logger.pool_stats();
        assert!(stats.allocated <= 2, "{stats:?}");
        assert_eq!(stats.idle, stats.allocated);
    }
}
