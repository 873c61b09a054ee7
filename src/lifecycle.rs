//! Lifecycle events delivered by a test runner, and the per-suite/test/step
//! state derived from them.
//!
//! Events are plain data and (de)serialize as tagged JSON objects, one per line
//! in a recorded stream:
//!
//! ```text
//! {"event":"suiteBegin","title":"Login"}
//! {"event":"testBegin","suite":"Login","test":"rejects bad password"}
//! {"event":"testEnd","suite":"Login","test":"rejects bad password","status":"failed","error":"expected 401"}
//! {"event":"runEnd","status":"failed"}
//! ```

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;

/// Final status of a single test as reported by the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    #[default]
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Interrupted,
}

impl TestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::TimedOut => "timedOut",
            Self::Interrupted => "interrupted",
        }
    }

    /// Timeouts and interruptions count as failures.
    pub const fn bucket(self) -> OutcomeBucket {
        match self {
            Self::Passed => OutcomeBucket::Passed,
            Self::Skipped => OutcomeBucket::Skipped,
            Self::Failed | Self::TimedOut | Self::Interrupted => OutcomeBucket::Failed,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepStatus {
    #[default]
    Passed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// The three mutually exclusive per-suite counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeBucket {
    Passed,
    Failed,
    Skipped,
}

/// Overall status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Passed,
    Failed,
    TimedOut,
    Interrupted,
}

impl RunStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::TimedOut => "timedOut",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    #[serde(default)]
    pub project_count: usize,
    #[serde(default)]
    pub worker_count: usize,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// A suite and its nested suites, as discovered by the runner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteNode {
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suites: Vec<SuiteNode>,
}

impl SuiteNode {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            suites: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.suites.push(child);
        self
    }
}

/// Everything the runner reports when a test finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub suite: String,
    pub test: String,
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screenshots: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<String>,
}

impl TestOutcome {
    pub fn new(suite: impl Into<String>, test: impl Into<String>, status: TestStatus) -> Self {
        Self {
            suite: suite.into(),
            test: test.into(),
            status,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn screenshot(mut self, path: impl Into<String>) -> Self {
        self.screenshots.push(path.into());
        self
    }

    #[must_use]
    pub fn video(mut self, path: impl Into<String>) -> Self {
        self.videos.push(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum LifecycleEvent {
    RunBegin(RunInfo),
    /// Begins the suite and, recursively, every nested suite.
    SuiteBegin(SuiteNode),
    SuiteEnd {
        title: String,
    },
    TestBegin {
        suite: String,
        test: String,
    },
    StepBegin {
        suite: String,
        test: String,
        step: String,
    },
    StepEnd {
        suite: String,
        test: String,
        step: String,
        #[serde(default)]
        error: Option<String>,
    },
    TestEnd(TestOutcome),
    RunEnd {
        status: RunStatus,
    },
}

impl LifecycleEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RunBegin(_) => "runBegin",
            Self::SuiteBegin(_) => "suiteBegin",
            Self::SuiteEnd { .. } => "suiteEnd",
            Self::TestBegin { .. } => "testBegin",
            Self::StepBegin { .. } => "stepBegin",
            Self::StepEnd { .. } => "stepEnd",
            Self::TestEnd(_) => "testEnd",
            Self::RunEnd { .. } => "runEnd",
        }
    }
}

/// Decode a JSON-lines event stream. Blank lines are skipped.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<LifecycleEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let event = serde_json::from_str(trimmed)
            .map_err(|err| Error::event(idx + 1, err.to_string()))?;
        events.push(event);
    }
    Ok(events)
}

/// Key of a test context within a run.
pub fn test_key(suite: &str, test: &str) -> String {
    format!("{suite}::{test}")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStepInfo {
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub status: StepStatus,
    pub error: Option<String>,
}

impl TestStepInfo {
    pub(crate) fn open(title: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            started_at,
            ended_at: None,
            duration_ms: None,
            status: StepStatus::Passed,
            error: None,
        }
    }

    pub const fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestExecutionContext {
    pub test_name: String,
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub status: TestStatus,
    pub error: Option<String>,
    pub steps: Vec<TestStepInfo>,
    pub screenshots: Vec<String>,
    pub videos: Vec<String>,
}

impl TestExecutionContext {
    pub(crate) fn begin(suite: &str, test: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            test_name: test.to_string(),
            suite_name: suite.to_string(),
            started_at,
            ended_at: None,
            duration_ms: None,
            status: TestStatus::Passed,
            error: None,
            steps: Vec::new(),
            screenshots: Vec::new(),
            videos: Vec::new(),
        }
    }

    pub fn key(&self) -> String {
        test_key(&self.suite_name, &self.test_name)
    }

    pub const fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Most recently begun step with `title` that has not ended yet.
    ///
    /// Two interleaved steps with the same title resolve innermost-first.
    pub(crate) fn last_open_step_mut(&mut self, title: &str) -> Option<&mut TestStepInfo> {
        self.steps
            .iter_mut()
            .rev()
            .find(|step| step.title == title && step.is_open())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SuiteTotals {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl SuiteTotals {
    pub const fn record(&mut self, bucket: OutcomeBucket) {
        match bucket {
            OutcomeBucket::Passed => self.passed += 1,
            OutcomeBucket::Failed => self.failed += 1,
            OutcomeBucket::Skipped => self.skipped += 1,
        }
        self.total += 1;
    }

    pub const fn absorb(&mut self, other: &Self) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.total += other.total;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteExecutionContext {
    pub suite_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub totals: SuiteTotals,
}

impl SuiteExecutionContext {
    pub(crate) fn begin(title: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            suite_name: title.to_string(),
            started_at,
            ended_at: None,
            duration_ms: None,
            totals: SuiteTotals::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.suite_name.is_empty()
    }

    /// Name used in summaries; the root suite has no title of its own.
    pub fn display_name(&self) -> &str {
        if self.is_root() {
            "(root)"
        } else {
            &self.suite_name
        }
    }
}
