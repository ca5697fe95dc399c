//! Routes records from the `log` facade into a [`Logger`].
//!
//! `Error`, `Warn` and `Info` records become Ops entries; `Debug` and
//! `Trace` records become Dev entries whose context is the record's target
//! (usually the module path) and whose source is the record's `file:line`.
//! Dev records still go through the context gate, so a crate's debug output
//! only shows up once its target is listed in `dev-contexts` or
//! `log-all-dev` is set.

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::entry::EntryKind;
use crate::error::LogError;
use crate::logger::{Logger, Source};

/// `log::Log` implementation feeding a [`Logger`].
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Logger,
    level: LevelFilter,
}

impl LogBridge {
    pub fn new(logger: Logger, level: LevelFilter) -> Self {
        Self { logger, level }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let rendered;
        let message = match record.args().as_str() {
            Some(message) => message,
            None => {
                rendered = record.args().to_string();
                rendered.as_str()
            }
        };

        match record.level() {
            Level::Error | Level::Warn => {
                self.logger
                    .for_ops("{} {}", &[&record.level(), &message]);
            }
            Level::Info => self.logger.for_ops(message, &[]),
            Level::Debug | Level::Trace => {
                let source = match (record.file(), record.line()) {
                    (Some(file), Some(line)) => Some(Source { file, line }),
                    _ => None,
                };
                self.logger
                    .submit(EntryKind::Dev, record.target(), source, message, &[]);
            }
        }
    }

    fn flush(&self) {}
}

/// Installs a [`LogBridge`] as the process-wide `log` logger.
///
/// Fails if another `log` logger was installed first.
pub fn install(logger: Logger, level: LevelFilter) -> Result<(), LogError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger, level)))?;
    log::set_max_level(level);
    Ok(())
}
