use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised inside the logging pipeline.
///
/// None of these ever reach a `for_dev`/`for_ops` caller. The dispatch loop
/// and the config store turn them into console diagnostics and carry on with
/// whatever state was last known to work.
#[derive(Debug, Error)]
pub enum LogError {
    /// A file (config or log output) could not be opened, read or written.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file was readable but is not a valid `LogConfig` document.
    #[error("{}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The dispatch thread could not be started.
    #[error("failed to spawn the log dispatch thread: {0}")]
    Spawn(#[source] io::Error),

    /// `configure` was called on a logger that is already configured.
    #[error("logger is already configured")]
    AlreadyConfigured,

    /// A `log` facade logger was already installed for this process.
    #[error("a log facade logger is already installed")]
    LoggerInstalled(#[from] log::SetLoggerError),
}

impl LogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LogError::Io {
            path: path.into(),
            source,
        }
    }
}
