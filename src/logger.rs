//! Structured, leveled logger.
//!
//! A [`LogCore`] owns the configuration, the sinks and the bounded history. One
//! core lives for the whole process ([`LogCore::global`]) and is initialised from
//! the environment on first use; [`Logger`] handles bind a context label to a
//! core and are cheap to clone.
//!
//! ```ignore
//! let log = Logger::for_context("Checkout");
//! log.info("cart loaded");
//! log.step("pay with card", StepPhase::Completed, Some(840));
//! // [2026-03-01T12:30:05.120Z] ℹ️ [Checkout] ✅ Step completed: pay with card (840ms)
//! ```

use crate::config::{LoggerConfig, LoggerConfigPatch};
use crate::entry::{LogEntry, Metadata};
use crate::level::LogLevel;
use crate::log_buffer::LogRingBuffer;
use crate::normalize::normalize_message;
use crate::sink::{ConsoleSink, FileSink, StdConsole};
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

const LOGGER_CONTEXT: &str = "Logger";

static GLOBAL_CORE: OnceLock<Arc<LogCore>> = OnceLock::new();

struct CoreState {
    config: LoggerConfig,
    file: Option<FileSink>,
    buffer: LogRingBuffer<LogEntry>,
    console: Arc<dyn ConsoleSink>,
}

impl CoreState {
    /// Diagnostic that bypasses the threshold, the file sink and the buffer.
    fn console_only(&self, level: LogLevel, message: &str) {
        let entry = LogEntry::new(
            Utc::now(),
            level,
            normalize_message(message, usize::MAX),
            LOGGER_CONTEXT.to_string(),
            None,
        );
        let line = entry.format_console(self.config.enable_timestamps, self.config.enable_colors);
        self.console.write_line(level, &line);
    }

    fn acquire_file(&mut self) {
        let path = self.config.log_file.clone();
        match FileSink::open(&path) {
            Ok(sink) => self.file = Some(sink),
            Err(err) => {
                self.file = None;
                self.console_only(
                    LogLevel::Warn,
                    &format!(
                        "File logging unavailable for {}: {err}; continuing with console output only",
                        path.display()
                    ),
                );
            }
        }
    }
}

/// Shared logger state: configuration, sinks and recent history.
pub struct LogCore {
    state: Mutex<CoreState>,
}

impl fmt::Debug for LogCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("LogCore")
            .field("config", &state.config)
            .field("file_active", &state.file.is_some())
            .field("buffered", &state.buffer.len())
            .finish_non_exhaustive()
    }
}

impl LogCore {
    /// A core writing to stdout/stderr.
    #[must_use]
    pub fn new(config: LoggerConfig) -> Self {
        Self::with_console(config, Arc::new(StdConsole))
    }

    #[must_use]
    pub fn with_console(config: LoggerConfig, console: Arc<dyn ConsoleSink>) -> Self {
        let wants_file = config.enable_file_logging;
        let mut state = CoreState {
            config,
            file: None,
            buffer: LogRingBuffer::default(),
            console,
        };
        if wants_file {
            state.acquire_file();
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// The process-wide core.
    ///
    /// The first call builds it from defaults merged with any environment
    /// overrides (see [`LoggerConfigPatch::from_env`]).
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL_CORE.get_or_init(|| {
            let core = Self::new(LoggerConfig::default());
            if let Some(patch) = LoggerConfigPatch::from_env() {
                core.configure(&patch);
            }
            Arc::new(core)
        }))
    }

    fn lock(&self) -> MutexGuard<'_, CoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Merge `patch` into the live configuration.
    ///
    /// Turning file logging on (or pointing it at a new path while on) acquires
    /// an append handle. If that fails a warning goes to the console and file
    /// logging stays inactive until a later call turns it off and on again.
    pub fn configure(&self, patch: &LoggerConfigPatch) {
        let mut state = self.lock();
        let was_enabled = state.config.enable_file_logging;
        let previous_path = state.config.log_file.clone();
        state.config.apply(patch);

        if !state.config.enable_file_logging {
            state.file = None;
            return;
        }
        let path_changed = state.config.log_file != previous_path;
        if !was_enabled || path_changed {
            state.acquire_file();
        }
    }

    pub fn config(&self) -> LoggerConfig {
        self.lock().config.clone()
    }

    /// Whether file lines are currently being written.
    pub fn file_logging_active(&self) -> bool {
        let state = self.lock();
        state.config.enable_file_logging && state.file.is_some()
    }

    pub fn set_console(&self, console: Arc<dyn ConsoleSink>) {
        self.lock().console = console;
    }

    /// Whether an entry at `level` would currently be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Silent && level >= self.lock().config.level
    }

    /// The last `count` entries, oldest first.
    pub fn recent_logs(&self, count: usize) -> Vec<LogEntry> {
        self.lock().buffer.recent(count).cloned().collect()
    }

    pub fn buffered_len(&self) -> usize {
        self.lock().buffer.len()
    }

    /// Empty the history buffer. Sinks and configuration are untouched.
    pub fn clear_buffer(&self) {
        self.lock().buffer.clear();
    }

    /// An empty console line at info level, used to separate report blocks.
    ///
    /// Not written to the file and not kept in the history buffer.
    fn blank_line(&self) {
        let state = self.lock();
        if LogLevel::Info >= state.config.level {
            state.console.write_line(LogLevel::Info, "");
        }
    }

    fn log(
        &self,
        level: LogLevel,
        context: Option<&str>,
        message: &dyn fmt::Display,
        metadata: Option<Metadata>,
    ) {
        if level == LogLevel::Silent {
            return;
        }
        let max_len = {
            let state = self.lock();
            if level < state.config.level {
                return;
            }
            state.config.max_line_length
        };
        // Format outside the lock; a Display impl may itself log.
        let message = normalize_message(&message.to_string(), max_len);

        let mut guard = self.lock();
        let state = &mut *guard;
        // The threshold may have been raised while the lock was released.
        if level < state.config.level {
            return;
        }
        let context = context.map_or_else(|| state.config.context.clone(), str::to_string);
        let entry = LogEntry::new(Utc::now(), level, message, context, metadata);

        let line = entry.format_console(state.config.enable_timestamps, state.config.enable_colors);
        state.console.write_line(level, &line);

        if state.config.enable_file_logging {
            if let Some(file) = state.file.as_mut() {
                let failure = match file.append(&entry.format_file()) {
                    Err(err) if file.take_first_failure() => {
                        Some(format!("Failed to write log file {}: {err}", file.path().display()))
                    }
                    _ => None,
                };
                if let Some(diagnostic) = failure {
                    state.console_only(LogLevel::Error, &diagnostic);
                }
            }
        }

        state.buffer.push(entry);
    }
}

/// Merge `patch` into the process-wide logger configuration.
pub fn configure(patch: &LoggerConfigPatch) {
    LogCore::global().configure(patch);
}

/// The last `count` entries logged through the process-wide core.
pub fn recent_logs(count: usize) -> Vec<LogEntry> {
    LogCore::global().recent_logs(count)
}

pub fn clear_buffer() {
    LogCore::global().clear_buffer();
}

/// Captured output of a remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Started,
    Completed,
    Failed,
}

impl StepPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Started => "▶️",
            Self::Completed => "✅",
            Self::Failed => "❌",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting,
    Running,
    Stopped,
    Failed,
}

impl ServiceState {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Starting => "🔄",
            Self::Running => "✅",
            Self::Stopped => "⏹️",
            Self::Failed => "❌",
        }
    }
}

/// A context-labelled handle onto a [`LogCore`].
#[derive(Debug, Clone)]
pub struct Logger {
    core: Arc<LogCore>,
    context: Option<String>,
}

impl Logger {
    /// Logger on the process-wide core.
    pub fn for_context(context: impl Into<String>) -> Self {
        Self::with_core(LogCore::global(), context)
    }

    /// Logger on an explicitly supplied core.
    pub fn with_core(core: Arc<LogCore>, context: impl Into<String>) -> Self {
        Self {
            core,
            context: Some(context.into()),
        }
    }

    /// Logger that labels entries with the core's configured default context.
    pub fn unlabeled(core: Arc<LogCore>) -> Self {
        Self {
            core,
            context: None,
        }
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub const fn core(&self) -> &Arc<LogCore> {
        &self.core
    }

    pub fn log(&self, level: LogLevel, message: impl fmt::Display, metadata: Option<Metadata>) {
        self.core
            .log(level, self.context.as_deref(), &message, metadata);
    }

    pub fn debug(&self, message: impl fmt::Display) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: impl fmt::Display) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: impl fmt::Display) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: impl fmt::Display) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn debug_with(&self, message: impl fmt::Display, metadata: impl Into<Metadata>) {
        self.log(LogLevel::Debug, message, Some(metadata.into()));
    }

    pub fn info_with(&self, message: impl fmt::Display, metadata: impl Into<Metadata>) {
        self.log(LogLevel::Info, message, Some(metadata.into()));
    }

    pub fn warn_with(&self, message: impl fmt::Display, metadata: impl Into<Metadata>) {
        self.log(LogLevel::Warn, message, Some(metadata.into()));
    }

    pub fn error_with(&self, message: impl fmt::Display, metadata: impl Into<Metadata>) {
        self.log(LogLevel::Error, message, Some(metadata.into()));
    }

    /// Log a remote command and, when given, its non-empty output streams.
    pub fn ssh_command(&self, command: &str, output: Option<&CommandOutput>) {
        self.debug(format_args!("SSH command: {command}"));
        let Some(output) = output else {
            return;
        };
        for (stream, text) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
            let text = normalize_message(text, usize::MAX);
            if !text.is_empty() {
                self.debug(format_args!("SSH {stream}: {text}"));
            }
        }
    }

    pub fn step(&self, name: &str, phase: StepPhase, duration_ms: Option<u64>) {
        match duration_ms {
            Some(ms) => self.info(format_args!(
                "{} Step {}: {name} ({ms}ms)",
                phase.icon(),
                phase.as_str()
            )),
            None => self.info(format_args!(
                "{} Step {}: {name}",
                phase.icon(),
                phase.as_str()
            )),
        }
    }

    pub fn service_status(&self, name: &str, state: ServiceState) {
        self.info(format_args!(
            "{} Service {name}: {}",
            state.icon(),
            state.as_str()
        ));
    }

    /// Print an empty console line, subject to the info threshold.
    pub fn separator(&self) {
        self.core.blank_line();
    }

    pub fn recent_logs(&self, count: usize) -> Vec<LogEntry> {
        self.core.recent_logs(count)
    }

    pub fn clear_buffer(&self) {
        self.core.clear_buffer();
    }

    /// Path of the active log file, if file logging is on and healthy.
    pub fn active_log_file(&self) -> Option<PathBuf> {
        let state = self.core.lock();
        state
            .file
            .as_ref()
            .filter(|_| state.config.enable_file_logging)
            .map(|file| file.path().to_path_buf())
    }
}
