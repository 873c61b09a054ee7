//! Output sinks for formatted log lines.
//!
//! The console sink is a trait so embedders and tests can capture output; the
//! file sink is a best-effort append-only handle owned by the log core.

use crate::level::LogLevel;
use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Destination for console-formatted lines.
///
/// Each call carries one complete line without the trailing newline.
pub trait ConsoleSink: Send + Sync {
    fn write_line(&self, level: LogLevel, line: &str);
}

/// Writes debug/info lines to stdout and warn/error lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl ConsoleSink for StdConsole {
    fn write_line(&self, level: LogLevel, line: &str) {
        // A closed stdout/stderr is not worth failing over.
        if level >= LogLevel::Warn {
            let _ = writeln!(io::stderr().lock(), "{line}");
        } else {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
    }
}

/// Captures console lines in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryConsole {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemoryConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    pub fn lines_at(&self, level: LogLevel) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|(lvl, _)| *lvl == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(LogLevel, String)>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConsoleSink for MemoryConsole {
    fn write_line(&self, level: LogLevel, line: &str) {
        self.lock().push((level, line.to_string()));
    }
}

/// Append handle for the log file.
#[derive(Debug)]
pub(crate) struct FileSink {
    path: PathBuf,
    file: File,
    failure_reported: bool,
}

impl FileSink {
    /// Open `path` for appending, creating it (but not its parents) if missing.
    pub(crate) fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            failure_reported: false,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn append(&mut self, line: &str) -> io::Result<()> {
        self.file.write_all(line.as_bytes())?;
        self.file.flush()
    }

    /// Returns `true` the first time it is called for this handle.
    pub(crate) fn take_first_failure(&mut self) -> bool {
        !std::mem::replace(&mut self.failure_reported, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_console_keeps_levels() {
        let console = MemoryConsole::new();
        console.write_line(LogLevel::Info, "one");
        console.write_line(LogLevel::Error, "two");

        assert_eq!(console.lines(), vec!["one", "two"]);
        assert_eq!(console.lines_at(LogLevel::Error), vec!["two"]);
        console.clear();
        assert!(console.is_empty());
    }

    #[test]
    fn file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.log");
        std::fs::write(&path, "existing\n").unwrap();

        let mut sink = FileSink::open(&path).unwrap();
        sink.append("next\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nnext\n");
        assert_eq!(sink.path(), path.as_path());
    }

    #[test]
    fn file_sink_open_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.log");
        assert!(FileSink::open(&path).is_err());
    }

    #[test]
    fn failure_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = FileSink::open(&dir.path().join("x.log")).unwrap();
        assert!(sink.take_first_failure());
        assert!(!sink.take_first_failure());
    }
}
