//! Test-execution telemetry.
//!
//! Two layers:
//! - a structured, leveled logger ([`Logger`], [`LogCore`]) writing normalized
//!   single-line entries to the console, an optional append-only file and a
//!   bounded in-memory history;
//! - a lifecycle aggregator ([`LifecycleAggregator`]) that turns a runner's
//!   suite/test/step begin and end events into durations, per-suite outcome
//!   tallies and an end-of-run summary, reported through the logger.
//!
//! # Example
//!
//! ```ignore
//! use testlens::{LifecycleAggregator, Logger, RunStatus, TestOutcome, TestStatus};
//!
//! let mut agg = LifecycleAggregator::new(Logger::for_context("Reporter"));
//! agg.suite_begin("Login");
//! agg.test_begin("Login", "accepts valid credentials");
//! agg.step_begin("Login", "accepts valid credentials", "fill form");
//! agg.step_end("Login", "accepts valid credentials", "fill form", None);
//! agg.test_end(&TestOutcome::new("Login", "accepts valid credentials", TestStatus::Passed));
//! let summary = agg.run_end(RunStatus::Passed);
//! assert_eq!(summary.totals.passed, 1);
//! ```

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod entry;
pub mod error;
pub mod level;
pub mod lifecycle;
pub mod log_buffer;
pub mod logger;
pub mod normalize;
pub mod sink;
pub mod summary;

pub use aggregator::{AGGREGATOR_CONTEXT, LifecycleAggregator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LoggerConfig, LoggerConfigPatch};
pub use entry::{LogEntry, Metadata, Scalar};
pub use error::{Error, Result};
pub use level::LogLevel;
pub use lifecycle::{
    LifecycleEvent, RunInfo, RunStatus, StepStatus, SuiteExecutionContext, SuiteNode,
    SuiteTotals, TestExecutionContext, TestOutcome, TestStatus, TestStepInfo, read_events,
};
pub use log_buffer::{LOG_BUFFER_CAPACITY, LogRingBuffer};
pub use logger::{
    CommandOutput, LogCore, Logger, ServiceState, StepPhase, clear_buffer, configure, recent_logs,
};
pub use normalize::normalize_message;
pub use sink::{ConsoleSink, MemoryConsole, StdConsole};
pub use summary::{FailedTest, RunSummary, SuiteSummary};
