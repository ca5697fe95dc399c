use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::clock::next_midnight;
use crate::error::LogError;

/// Builds the log file name for the local calendar day of `now`.
///
/// ```
/// # use chrono::{Local, TimeZone};
/// # use dual_logger::rotation::daily_file_name;
/// let now = Local.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap();
/// assert_eq!(daily_file_name("logs/app", now).to_str(), Some("logs/app-20260314.log"));
/// ```
pub fn daily_file_name(prefix: &str, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("{}-{}.log", prefix, now.format("%Y%m%d")))
}

/// The log file currently being appended to, plus when it must be replaced.
///
/// Owned by the dispatch loop, which is the only code that ever touches it,
/// so at most one handle is open at any time.
#[derive(Debug, Default)]
pub struct RotatingFile {
    handle: Option<File>,
    path: Option<PathBuf>,
    next_rotation: Option<DateTime<Local>>,
    closed: u64,
}

impl RotatingFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure a file for the current local day is open.
    ///
    /// A handle whose day has ended is closed first. If no handle is open
    /// afterwards a new one named for `now` is created in append mode and
    /// the deadline moves to the following midnight. On failure the handle
    /// stays unset and the next call tries again.
    ///
    /// Returns the path of a newly opened file, `None` if the current one
    /// is still good.
    pub fn ensure_rotated(
        &mut self,
        prefix: &str,
        now: DateTime<Local>,
    ) -> Result<Option<&Path>, LogError> {
        if self.handle.is_some() && self.next_rotation.is_some_and(|deadline| now > deadline) {
            self.close();
        }
        if self.handle.is_some() {
            return Ok(None);
        }

        let path = daily_file_name(prefix, now);
        let file = open_append(&path).map_err(|e| LogError::io(&path, e))?;
        self.handle = Some(file);
        self.next_rotation = Some(next_midnight(now));
        let path: &Path = self.path.insert(path);
        Ok(Some(path))
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn next_rotation(&self) -> Option<DateTime<Local>> {
        self.next_rotation
    }

    /// How many handles have been closed so far.
    pub fn closed_count(&self) -> u64 {
        self.closed
    }

    /// Appends one rendered line to the open file.
    pub fn write_line(&mut self, line: &str) -> Result<(), LogError> {
        let (Some(file), Some(path)) = (self.handle.as_mut(), self.path.as_ref()) else {
            return Ok(());
        };
        file.write_all(line.as_bytes())
            .map_err(|e| LogError::io(path, e))
    }

    /// Flushes the open file durably to storage. No-op with no file open.
    pub fn sync(&mut self) -> Result<(), LogError> {
        match (self.handle.as_ref(), self.path.as_ref()) {
            (Some(file), Some(path)) => file.sync_data().map_err(|e| LogError::io(path, e)),
            _ => Ok(()),
        }
    }

    /// Closes the current handle, if any.
    pub fn close(&mut self) {
        if self.handle.take().is_some() {
            self.closed += 1;
        }
    }
}

#[cfg(unix)]
fn open_append(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    // Shared log directories are written by several service accounts.
    OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o777)
        .open(path)
}

#[cfg(not(unix))]
fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_open_failure_leaves_handle_unset() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("missing-dir").join("app");
        let now = Local.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let mut file = RotatingFile::new();
        let err = file.ensure_rotated(prefix.to_str().unwrap(), now).unwrap_err();
        assert!(matches!(err, LogError::Io { .. }));
        assert!(!file.is_open());
        assert!(file.next_rotation().is_none());
    }

    #[test]
    fn test_same_day_keeps_handle() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("app");
        let prefix = prefix.to_str().unwrap();
        let morning = Local.with_ymd_and_hms(2026, 3, 14, 8, 0, 0).unwrap();
        let evening = Local.with_ymd_and_hms(2026, 3, 14, 20, 0, 0).unwrap();

        let mut file = RotatingFile::new();
        assert!(file.ensure_rotated(prefix, morning).unwrap().is_some());
        assert!(file.ensure_rotated(prefix, evening).unwrap().is_none());
        assert_eq!(file.closed_count(), 0);
    }

    #[test]
    fn test_write_without_handle_is_noop() {
        let mut file = RotatingFile::new();
        assert!(file.write_line("dropped\n").is_ok());
        assert!(file.sync().is_ok());
    }
}
