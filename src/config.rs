use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use arc_swap::{ArcSwap, Guard};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::console::Console;
use crate::error::LogError;

/// Context enabled by the built-in configuration.
pub const DEFAULT_DEV_CONTEXT: &str = "DB";

/// A complete logging configuration.
///
/// Decoded from a JSON document such as:
///
/// ```json
/// {
///   "console": true,
///   "filename": "/var/log/service/app",
///   "log-all-dev": false,
///   "dev-contexts": { "DB": true, "NET": false }
/// }
/// ```
///
/// Fields missing from the document decode to `false` / empty. The
/// `Default` impl is the built-in configuration used before any file has
/// been loaded: console on, no file, every dev context enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(rename = "console", default)]
    pub console_enabled: bool,

    /// Log file prefix; the file sink is idle while this is empty.
    #[serde(rename = "filename", default)]
    pub file_name_prefix: String,

    #[serde(rename = "log-all-dev", default)]
    pub log_all_dev: bool,

    #[serde(rename = "dev-contexts", default)]
    pub dev_contexts: HashMap<String, bool>,
}

impl LogConfig {
    /// Whether a Dev entry for `context` should be delivered.
    pub fn allows(&self, context: &str) -> bool {
        self.log_all_dev || self.dev_contexts.get(context).copied().unwrap_or(false)
    }

    pub fn file_enabled(&self) -> bool {
        !self.file_name_prefix.is_empty()
    }

    /// Decodes a config document.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_name_prefix: String::new(),
            log_all_dev: true,
            dev_contexts: HashMap::from([(DEFAULT_DEV_CONTEXT.to_string(), true)]),
        }
    }
}

/// Result of a reload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Nothing to do: no path configured, or the file has not changed.
    Unchanged,
    /// A new configuration is now active.
    Reloaded,
    /// The file could not be read or decoded; the previous config remains.
    Failed,
}

#[derive(Debug, Default)]
struct ConfigWatch {
    path: Option<PathBuf>,
    last_modified: Option<SystemTime>,
    prefix_override: Option<String>,
}

/// Holds the active [`LogConfig`] and watches the file it came from.
///
/// Readers get an immutable snapshot; a reload swaps in a whole new value,
/// so a reader never sees half of one config and half of another.
pub struct ConfigStore {
    current: ArcSwap<LogConfig>,
    watch: Mutex<ConfigWatch>,
    console: Console,
}

impl ConfigStore {
    pub fn new(initial: LogConfig, console: Console) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
            watch: Mutex::new(ConfigWatch::default()),
            console,
        }
    }

    /// Cheap snapshot for the producer hot path.
    #[inline]
    pub fn load(&self) -> Guard<Arc<LogConfig>> {
        self.current.load()
    }

    /// Owned snapshot of the active config.
    pub fn current(&self) -> Arc<LogConfig> {
        self.current.load_full()
    }

    /// Replaces the active config wholesale. A configured prefix override is
    /// applied to the new value.
    pub fn replace(&self, config: LogConfig) {
        let watch = self.watch.lock();
        self.store(config, &watch);
    }

    /// Sets the file to watch and the prefix override. Does not load.
    pub fn watch(&self, path: Option<PathBuf>, prefix_override: Option<String>) {
        let mut watch = self.watch.lock();
        watch.path = path;
        watch.last_modified = None;
        watch.prefix_override = prefix_override;
        if watch.prefix_override.is_some() {
            let config = LogConfig::clone(&self.current.load());
            self.store(config, &watch);
        }
    }

    /// Reads and decodes the watched file, replacing the active config on
    /// success. Failures are reported on the console and leave the previous
    /// config in effect.
    pub fn load_config(&self) -> ReloadOutcome {
        let mut watch = self.watch.lock();
        self.load_locked(&mut watch)
    }

    /// Reloads the watched file if its modification time moved past the
    /// last one observed.
    pub fn check_config_file(&self) -> ReloadOutcome {
        let mut watch = self.watch.lock();
        let Some(path) = watch.path.as_deref() else {
            return ReloadOutcome::Unchanged;
        };
        let Ok(modified) = fs::metadata(path).and_then(|meta| meta.modified()) else {
            return ReloadOutcome::Unchanged;
        };
        if watch.last_modified.is_some_and(|last| modified <= last) {
            return ReloadOutcome::Unchanged;
        }
        self.load_locked(&mut watch)
    }

    fn load_locked(&self, watch: &mut ConfigWatch) -> ReloadOutcome {
        let Some(path) = watch.path.clone() else {
            return ReloadOutcome::Unchanged;
        };
        self.console.banner(format_args!(
            "Loading logging configuration [{}]",
            path.display()
        ));

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => {
                let err = LogError::io(&path, e);
                tracing::warn!(error = %err, "failed to open log config file");
                self.console
                    .banner(format_args!("Failed to open log config file: {err}"));
                return ReloadOutcome::Failed;
            }
        };
        // Recorded even when decoding fails, so a broken file is retried
        // only once it changes again.
        if let Ok(modified) = file.metadata().and_then(|meta| meta.modified()) {
            watch.last_modified = Some(modified);
        }

        match decode(&path, file) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "log configuration loaded");
                self.store(config, watch);
                ReloadOutcome::Reloaded
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to process log config file");
                self.console
                    .banner(format_args!("Failed to process log config file: {err}"));
                ReloadOutcome::Failed
            }
        }
    }

    fn store(&self, mut config: LogConfig, watch: &ConfigWatch) {
        if let Some(prefix) = &watch.prefix_override {
            config.file_name_prefix.clone_from(prefix);
        }
        self.current.store(Arc::new(config));
    }
}

fn decode(path: &Path, file: File) -> Result<LogConfig, LogError> {
    serde_json::from_reader(BufReader::new(file)).map_err(|source| LogError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.console_enabled);
        assert!(!config.file_enabled());
        assert!(config.allows("DB"));
        assert!(config.allows("anything"));
    }

    #[test]
    fn test_allow_list() {
        let config = LogConfig::from_json(
            r#"{"log-all-dev": false, "dev-contexts": {"DB": true, "NET": false}}"#,
        )
        .unwrap();
        assert!(config.allows("DB"));
        assert!(!config.allows("NET"));
        assert!(!config.allows("UI"));
    }

    #[test]
    fn test_missing_fields_decode_to_zero_values() {
        let config = LogConfig::from_json("{}").unwrap();
        assert!(!config.console_enabled);
        assert!(!config.log_all_dev);
        assert!(config.file_name_prefix.is_empty());
        assert!(config.dev_contexts.is_empty());
    }

    #[test]
    fn test_full_document() {
        let config = LogConfig::from_json(
            r#"{"console": true, "filename": "/tmp/app", "log-all-dev": true, "dev-contexts": {}}"#,
        )
        .unwrap();
        assert!(config.console_enabled);
        assert_eq!(config.file_name_prefix, "/tmp/app");
        assert!(config.log_all_dev);
    }
}
