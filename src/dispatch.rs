use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{select, tick, Receiver};

use crate::clock::Clock;
use crate::config::ConfigStore;
use crate::console::Console;
use crate::entry::{EntryPool, LogEntry};
use crate::render;
use crate::rotation::RotatingFile;

/// How often the watched config file is polled.
pub const CONFIG_CHECK_INTERVAL: Duration = Duration::from_secs(10);
/// How often an open log file is flushed to storage.
pub const FILE_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the dispatch loop owns. Built by the logger and moved onto the
/// dispatch thread; nothing else ever touches the open file.
pub(crate) struct Dispatcher {
    pub(crate) console_rx: Receiver<Box<LogEntry>>,
    pub(crate) file_rx: Receiver<Box<LogEntry>>,
    pub(crate) shutdown_rx: Receiver<()>,
    pub(crate) pool: Arc<EntryPool>,
    pub(crate) config: Arc<ConfigStore>,
    pub(crate) console: Console,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config_check_interval: Duration,
    pub(crate) file_sync_interval: Duration,
    pub(crate) file: RotatingFile,
    pub(crate) line: String,
}

impl Dispatcher {
    /// Runs until `shutdown` is signalled or every logger handle is gone.
    ///
    /// Exactly one event is handled per iteration. When several are ready
    /// `select!` picks one at random, so neither timers nor sinks starve.
    pub(crate) fn run(mut self) {
        let config_tick = tick(self.config_check_interval);
        let sync_tick = tick(self.file_sync_interval);
        // Local handles so the select borrows don't overlap `&mut self`.
        let console_rx = self.console_rx.clone();
        let file_rx = self.file_rx.clone();
        let shutdown_rx = self.shutdown_rx.clone();

        loop {
            select! {
                recv(config_tick) -> _ => {
                    self.config.check_config_file();
                }
                recv(sync_tick) -> _ => self.sync_file(),
                recv(console_rx) -> msg => match msg {
                    Ok(entry) => self.log_to_console(entry),
                    Err(_) => break,
                },
                recv(file_rx) -> msg => match msg {
                    Ok(entry) => self.log_to_file(entry),
                    Err(_) => break,
                },
                recv(shutdown_rx) -> _ => break,
            }
        }

        self.drain();
        tracing::debug!("dispatch loop stopped");
    }

    /// Writes whatever is still queued, then syncs and closes the file.
    fn drain(&mut self) {
        while let Ok(entry) = self.console_rx.try_recv() {
            self.log_to_console(entry);
        }
        while let Ok(entry) = self.file_rx.try_recv() {
            self.log_to_file(entry);
        }
        self.sync_file();
        self.file.close();
    }

    fn sync_file(&mut self) {
        if let Err(err) = self.file.sync() {
            tracing::warn!(error = %err, "failed to sync log file");
            self.console
                .banner(format_args!("Failed to sync log file: {err}"));
        }
    }

    fn log_to_console(&mut self, entry: Box<LogEntry>) {
        render::console_line(&entry, self.clock.now(), &mut self.line);
        self.pool.release(entry);
        // Nowhere to report a broken console.
        let _ = self.console.write_line(&self.line);
    }

    fn log_to_file(&mut self, entry: Box<LogEntry>) {
        // The prefix may have been cleared after this entry was queued.
        if !self.config.load().file_enabled() {
            self.file.close();
            self.pool.release(entry);
            return;
        }

        let now = self.clock.now();
        self.ensure_rotated_file(now);

        if self.file.is_open() {
            render::file_line(&entry, now, &mut self.line);
            if let Err(err) = self.file.write_line(&self.line) {
                tracing::warn!(error = %err, "failed to write to log file");
                self.console
                    .banner(format_args!("Failed to write to file: {err}"));
            }
        } else {
            self.console.banner(format_args!("not logging to file"));
        }
        self.pool.release(entry);
    }

    fn ensure_rotated_file(&mut self, now: chrono::DateTime<chrono::Local>) {
        let config = self.config.load();
        match self.file.ensure_rotated(&config.file_name_prefix, now) {
            Ok(Some(path)) => {
                tracing::info!(path = %path.display(), "log file opened");
                self.console.banner(format_args!(
                    "Creating log file [{}] {}",
                    path.display(),
                    now.format("%Y-%m-%d")
                ));
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to create log file");
                self.console
                    .banner(format_args!("Failed to create log file {err}"));
            }
        }
    }
}
