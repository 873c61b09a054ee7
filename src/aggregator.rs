//! Hierarchical suite → test → step bookkeeping driven by runner events.
//!
//! The aggregator consumes events strictly in arrival order on one thread. It
//! never fails: events that reference unknown suites, tests or steps are dropped
//! with a debug line, and test failures are recorded as data.
//!
//! Tests are keyed by `"suite::test"`. Two tests with identical suite and test
//! titles cannot be told apart; runners must not interleave their events.

use crate::clock::{Clock, SystemClock, elapsed_ms};
use crate::lifecycle::{
    LifecycleEvent, OutcomeBucket, RunInfo, RunStatus, StepStatus, SuiteExecutionContext,
    SuiteNode, SuiteTotals, TestExecutionContext, TestOutcome, TestStepInfo, test_key,
};
use crate::entry::Metadata;
use crate::logger::{Logger, StepPhase};
use crate::normalize::normalize_message;
use crate::summary::{FailedTest, RunSummary, SuiteSummary};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const AGGREGATOR_CONTEXT: &str = "TestLifecycle";

const RULE: &str = "============================================================";

pub struct LifecycleAggregator {
    logger: Logger,
    clock: Arc<dyn Clock>,
    run_started_at: Option<DateTime<Utc>>,
    run_ended_at: Option<DateTime<Utc>>,
    suites: Vec<SuiteExecutionContext>,
    suite_index: HashMap<String, usize>,
    tests: Vec<TestExecutionContext>,
    test_index: HashMap<String, usize>,
    /// Every failed attempt, in the order it ended.
    failures: Vec<FailedTest>,
}

impl fmt::Debug for LifecycleAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleAggregator")
            .field("run_started_at", &self.run_started_at)
            .field("run_ended_at", &self.run_ended_at)
            .field("suites", &self.suites.len())
            .field("tests", &self.tests.len())
            .field("failures", &self.failures.len())
            .finish_non_exhaustive()
    }
}

impl Default for LifecycleAggregator {
    fn default() -> Self {
        Self::new(Logger::for_context(AGGREGATOR_CONTEXT))
    }
}

impl LifecycleAggregator {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self::with_clock(logger, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(logger: Logger, clock: Arc<dyn Clock>) -> Self {
        Self {
            logger,
            clock,
            run_started_at: None,
            run_ended_at: None,
            suites: Vec::new(),
            suite_index: HashMap::new(),
            tests: Vec::new(),
            test_index: HashMap::new(),
            failures: Vec::new(),
        }
    }

    pub const fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Forget every suite, test and run timestamp.
    pub fn reset(&mut self) {
        self.run_started_at = None;
        self.run_ended_at = None;
        self.suites.clear();
        self.suite_index.clear();
        self.tests.clear();
        self.test_index.clear();
        self.failures.clear();
    }

    /// Dispatch one event. Returns the summary when the event ends the run.
    pub fn apply(&mut self, event: &LifecycleEvent) -> Option<RunSummary> {
        match event {
            LifecycleEvent::RunBegin(info) => self.run_begin(info),
            LifecycleEvent::SuiteBegin(node) => self.suite_tree_begin(node),
            LifecycleEvent::SuiteEnd { title } => self.suite_end(title),
            LifecycleEvent::TestBegin { suite, test } => self.test_begin(suite, test),
            LifecycleEvent::StepBegin { suite, test, step } => self.step_begin(suite, test, step),
            LifecycleEvent::StepEnd {
                suite,
                test,
                step,
                error,
            } => self.step_end(suite, test, step, error.as_deref()),
            LifecycleEvent::TestEnd(outcome) => self.test_end(outcome),
            LifecycleEvent::RunEnd { status } => return Some(self.run_end(*status)),
        }
        None
    }

    /// Apply a recorded stream and return the summary of its last run.
    ///
    /// A stream that stops without `runEnd` is closed as interrupted.
    pub fn replay<'a, I>(&mut self, events: I) -> RunSummary
    where
        I: IntoIterator<Item = &'a LifecycleEvent>,
    {
        let mut last = None;
        let mut open = false;
        for event in events {
            match self.apply(event) {
                Some(summary) => {
                    last = Some(summary);
                    open = false;
                }
                None => open = true,
            }
        }
        match last {
            Some(summary) if !open => summary,
            _ => {
                self.logger
                    .warn("Event stream ended without runEnd; closing run as interrupted");
                self.run_end(RunStatus::Interrupted)
            }
        }
    }

    pub fn run_begin(&mut self, info: &RunInfo) {
        self.reset();
        self.run_started_at = Some(self.clock.now());

        self.logger.info(RULE);
        self.logger.info(format_args!(
            "🚀 Starting test run: {} project(s), {} worker(s)",
            info.project_count, info.worker_count
        ));
        if let Some(dir) = info.output_dir.as_deref().filter(|dir| !dir.is_empty()) {
            self.logger.info(format_args!("📂 Output directory: {dir}"));
        }
        self.logger.info(RULE);
    }

    pub fn suite_begin(&mut self, title: &str) {
        if self.suite_index.contains_key(title) {
            self.logger
                .debug(format_args!("Suite '{title}' already begun; keeping its state"));
            return;
        }
        let now = self.clock.now();
        self.insert_suite(title, now);
        if !title.is_empty() {
            self.logger.info(format_args!("📁 Suite started: {title}"));
        }
    }

    /// Begin `node` and every suite nested under it, parents first.
    pub fn suite_tree_begin(&mut self, node: &SuiteNode) {
        self.suite_begin(&node.title);
        for child in &node.suites {
            self.suite_tree_begin(child);
        }
    }

    pub fn suite_end(&mut self, title: &str) {
        let now = self.clock.now();
        let Some(&idx) = self.suite_index.get(title) else {
            self.logger
                .debug(format_args!("suiteEnd for unknown suite '{title}' ignored"));
            return;
        };
        let suite = &mut self.suites[idx];
        if suite.ended_at.is_some() {
            return;
        }
        let duration = elapsed_ms(suite.started_at, now);
        suite.ended_at = Some(now);
        suite.duration_ms = Some(duration);
        if !suite.is_root() {
            self.logger
                .info(format_args!("📁 Suite finished: {title} ({duration}ms)"));
        }
    }

    pub fn test_begin(&mut self, suite: &str, test: &str) {
        let now = self.clock.now();
        if !self.suite_index.contains_key(suite) {
            self.logger.debug(format_args!(
                "Suite '{suite}' was never begun; tracking it from its first test"
            ));
            self.insert_suite(suite, now);
        }

        let key = test_key(suite, test);
        let context = TestExecutionContext::begin(suite, test, now);
        if let Some(&idx) = self.test_index.get(&key) {
            self.logger
                .debug(format_args!("Test '{key}' began again; starting a fresh attempt"));
            self.tests[idx] = context;
        } else {
            self.test_index.insert(key, self.tests.len());
            self.tests.push(context);
        }
        self.logger.info(format_args!("🧪 Test started: {test}"));
    }

    pub fn step_begin(&mut self, suite: &str, test: &str, step: &str) {
        let now = self.clock.now();
        let key = test_key(suite, test);
        let Some(&idx) = self.test_index.get(&key) else {
            self.logger
                .debug(format_args!("stepBegin '{step}' for unknown test '{key}' ignored"));
            return;
        };
        self.tests[idx].steps.push(TestStepInfo::open(step, now));
        self.logger.debug(format_args!("Step started: {step}"));
    }

    /// Close the most recent open step named `step`.
    pub fn step_end(&mut self, suite: &str, test: &str, step: &str, error: Option<&str>) {
        let now = self.clock.now();
        let key = test_key(suite, test);
        let Some(&idx) = self.test_index.get(&key) else {
            self.logger
                .debug(format_args!("stepEnd '{step}' for unknown test '{key}' ignored"));
            return;
        };
        let Some(info) = self.tests[idx].last_open_step_mut(step) else {
            self.logger
                .debug(format_args!("stepEnd '{step}' has no open step in '{key}'"));
            return;
        };

        let duration = elapsed_ms(info.started_at, now);
        info.ended_at = Some(now);
        info.duration_ms = Some(duration);
        info.status = if error.is_some() {
            StepStatus::Failed
        } else {
            StepStatus::Passed
        };
        info.error = error.map(str::to_string);

        let phase = if error.is_some() {
            StepPhase::Failed
        } else {
            StepPhase::Completed
        };
        self.logger.step(step, phase, Some(duration));
        if let Some(error) = error {
            self.logger.debug(format_args!("Step '{step}' error: {error}"));
        }
    }

    pub fn test_end(&mut self, outcome: &TestOutcome) {
        let now = self.clock.now();
        let key = test_key(&outcome.suite, &outcome.test);
        let Some(&idx) = self.test_index.get(&key) else {
            self.logger
                .debug(format_args!("testEnd for unknown test '{key}' ignored"));
            return;
        };
        let context = &mut self.tests[idx];
        if context.is_finished() {
            self.logger
                .debug(format_args!("testEnd for already finished test '{key}' ignored"));
            return;
        }

        let duration = elapsed_ms(context.started_at, now);
        context.ended_at = Some(now);
        context.duration_ms = Some(duration);
        context.status = outcome.status;
        context.error.clone_from(&outcome.error);
        context.screenshots.extend(outcome.screenshots.iter().cloned());
        context.videos.extend(outcome.videos.iter().cloned());

        let mut abandoned = 0_usize;
        for step in context.steps.iter_mut().filter(|step| step.is_open()) {
            step.ended_at = Some(now);
            step.duration_ms = Some(elapsed_ms(step.started_at, now));
            step.status = StepStatus::Skipped;
            abandoned += 1;
        }

        let bucket = outcome.status.bucket();
        if let Some(&suite_idx) = self.suite_index.get(&outcome.suite) {
            self.suites[suite_idx].totals.record(bucket);
            if bucket == OutcomeBucket::Failed {
                self.failures.push(FailedTest {
                    suite: outcome.suite.clone(),
                    test: outcome.test.clone(),
                    status: outcome.status,
                    error: outcome.error.clone(),
                });
            }
        }

        let test = &outcome.test;
        let status = outcome.status;
        if let Some(error) = &outcome.error {
            // Metadata is rendered after truncation, so a long title cannot hide the error.
            self.logger.error_with(
                format_args!("❌ Test {status}: {test} ({duration}ms)"),
                Metadata::Error {
                    message: normalize_message(error, usize::MAX),
                },
            );
        } else {
            match bucket {
                OutcomeBucket::Passed => self
                    .logger
                    .info(format_args!("✅ Test passed: {test} ({duration}ms)")),
                OutcomeBucket::Skipped => self.logger.info(format_args!("⏭️ Test skipped: {test}")),
                OutcomeBucket::Failed => self
                    .logger
                    .warn(format_args!("❌ Test {status}: {test} ({duration}ms)")),
            }
        }
        if abandoned > 0 {
            self.logger.debug(format_args!(
                "{abandoned} step(s) still open when '{test}' ended; marked skipped"
            ));
        }
        for path in &outcome.screenshots {
            self.logger.debug(format_args!("📸 Screenshot: {path}"));
        }
        for path in &outcome.videos {
            self.logger.debug(format_args!("🎥 Video: {path}"));
        }
    }

    /// Close the run, log the summary and return it.
    pub fn run_end(&mut self, status: RunStatus) -> RunSummary {
        let now = self.clock.now();
        let started_at = self
            .run_started_at
            .or_else(|| self.suites.iter().map(|suite| suite.started_at).min())
            .unwrap_or(now);
        self.run_started_at = Some(started_at);
        self.run_ended_at = Some(now);
        let duration = elapsed_ms(started_at, now);

        for suite in self.suites.iter_mut().filter(|suite| suite.ended_at.is_none()) {
            suite.ended_at = Some(now);
            suite.duration_ms = Some(elapsed_ms(suite.started_at, now));
        }
        let totals = self.grand_totals();

        self.logger.info(RULE);
        self.logger
            .info(format_args!("🏁 Test run finished: {status} in {duration}ms"));
        self.logger.info(format_args!(
            "📊 Total: {} | Passed: {} | Failed: {} | Skipped: {}",
            totals.total, totals.passed, totals.failed, totals.skipped
        ));
        self.logger.info(RULE);

        let mut suites = Vec::new();
        for suite in self.suites.iter().filter(|suite| suite.totals.total > 0) {
            let name = suite.display_name();
            let t = suite.totals;
            let suite_duration = suite.duration_ms.unwrap_or_default();
            self.logger.info(format_args!("📁 {name}"));
            self.logger.info(format_args!(
                "Total: {} | Passed: {} | Failed: {} | Skipped: {} | Duration: {suite_duration}ms",
                t.total, t.passed, t.failed, t.skipped
            ));
            if t.failed > 0 {
                self.logger
                    .warn(format_args!("⚠️ {} test(s) failed in {name}", t.failed));
            }
            self.logger.separator();

            suites.push(SuiteSummary {
                name: name.to_string(),
                totals: t,
                duration_ms: suite_duration,
            });
        }

        let failures = self.failures.clone();

        RunSummary {
            status,
            started_at,
            ended_at: now,
            duration_ms: duration,
            totals,
            suites,
            failures,
        }
    }

    /// Bucket counts summed over every suite.
    pub fn grand_totals(&self) -> SuiteTotals {
        self.suites.iter().fold(SuiteTotals::default(), |mut acc, suite| {
            acc.absorb(&suite.totals);
            acc
        })
    }

    pub fn test_context(&self, suite: &str, test: &str) -> Option<&TestExecutionContext> {
        self.test_index
            .get(&test_key(suite, test))
            .map(|&idx| &self.tests[idx])
    }

    pub fn suite_context(&self, title: &str) -> Option<&SuiteExecutionContext> {
        self.suite_index.get(title).map(|&idx| &self.suites[idx])
    }

    /// Suites in discovery order.
    pub fn suites(&self) -> &[SuiteExecutionContext] {
        &self.suites
    }

    /// Tests in the order they first began.
    pub fn tests(&self) -> &[TestExecutionContext] {
        &self.tests
    }

    pub const fn run_started_at(&self) -> Option<DateTime<Utc>> {
        self.run_started_at
    }

    pub fn run_duration_ms(&self) -> Option<u64> {
        match (self.run_started_at, self.run_ended_at) {
            (Some(start), Some(end)) => Some(elapsed_ms(start, end)),
            _ => None,
        }
    }

    fn insert_suite(&mut self, title: &str, now: DateTime<Utc>) {
        self.suite_index.insert(title.to_string(), self.suites.len());
        self.suites.push(SuiteExecutionContext::begin(title, now));
    }
}
