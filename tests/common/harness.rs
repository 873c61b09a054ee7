//! Test harness for telemetry tests.
//!
//! The `TelemetryHarness` provides:
//! - A private log core whose console output is captured in memory
//! - A manual clock so durations are deterministic
//! - A temporary directory for file-sink tests
//! - Automatic dump of captured console lines on test failure (panic)
//!
//! # Example
//!
//! ```ignore
//! #[test]
//! fn test_something() {
//!     let harness = TelemetryHarness::new("test_something");
//!     let mut agg = harness.aggregator();
//!     agg.test_begin("Suite", "case");
//!     harness.advance_ms(25);
//!     agg.test_end(&TestOutcome::new("Suite", "case", TestStatus::Passed));
//!     assert!(harness.console_contains("Test passed: case (25ms)"));
//! }
//! ```

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use testlens::{
    AGGREGATOR_CONTEXT, LifecycleAggregator, LogCore, LogLevel, Logger, LoggerConfig,
    ManualClock, MemoryConsole,
};

/// Harness providing a captured log core, a manual clock and a temp directory.
pub struct TelemetryHarness {
    name: String,
    temp_dir: TempDir,
    core: Arc<LogCore>,
    console: MemoryConsole,
    clock: ManualClock,
}

impl TelemetryHarness {
    /// Debug threshold, no timestamps, no colors: console lines are stable.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(
            name,
            LoggerConfig {
                level: LogLevel::Debug,
                enable_timestamps: false,
                enable_colors: false,
                ..LoggerConfig::default()
            },
        )
    }

    pub fn with_config(name: impl Into<String>, config: LoggerConfig) -> Self {
        let console = MemoryConsole::new();
        let core = Arc::new(LogCore::with_console(config, Arc::new(console.clone())));
        Self {
            name: name.into(),
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            core,
            console,
            clock: ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 2, 10, 8, 0, 0).unwrap()),
        }
    }

    pub fn core(&self) -> Arc<LogCore> {
        Arc::clone(&self.core)
    }

    pub fn logger(&self, context: &str) -> Logger {
        Logger::with_core(self.core(), context)
    }

    pub fn aggregator(&self) -> LifecycleAggregator {
        LifecycleAggregator::with_clock(
            self.logger(AGGREGATOR_CONTEXT),
            Arc::new(self.clock.clone()),
        )
    }

    pub fn advance_ms(&self, ms: i64) {
        self.clock.advance_ms(ms);
    }

    pub const fn console(&self) -> &MemoryConsole {
        &self.console
    }

    pub fn console_lines(&self) -> Vec<String> {
        self.console.lines()
    }

    pub fn console_contains(&self, needle: &str) -> bool {
        self.console.lines().iter().any(|line| line.contains(needle))
    }

    /// Normalized messages currently held in the core's history buffer.
    pub fn messages(&self) -> Vec<String> {
        self.core
            .recent_logs(usize::MAX)
            .iter()
            .map(|entry| entry.message().to_string())
            .collect()
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn temp_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TelemetryHarness {
    fn drop(&mut self) {
        if std::thread::panicking() {
            eprintln!("\n=== CAPTURED CONSOLE: {} ===", self.name);
            for line in self.console.lines() {
                eprintln!("{line}");
            }
            eprintln!("=== END CAPTURED CONSOLE ===");
        }
    }
}
