//! Common test infrastructure for `testlens`.
//!
//! - A harness with a captured log core, manual clock and temp directory
//! - Builders for recorded lifecycle event streams

pub mod harness;

#[allow(unused_imports)]
pub use harness::TelemetryHarness;

use testlens::{LifecycleEvent, RunStatus, SuiteNode, TestOutcome, TestStatus};

/// The canonical single-suite login run used by several tests.
#[allow(dead_code)]
pub fn login_run_events() -> Vec<LifecycleEvent> {
    vec![
        LifecycleEvent::SuiteBegin(SuiteNode::new("Login")),
        LifecycleEvent::TestBegin {
            suite: "Login".to_string(),
            test: "A".to_string(),
        },
        LifecycleEvent::StepBegin {
            suite: "Login".to_string(),
            test: "A".to_string(),
            step: "fill".to_string(),
        },
        LifecycleEvent::StepEnd {
            suite: "Login".to_string(),
            test: "A".to_string(),
            step: "fill".to_string(),
            error: None,
        },
        LifecycleEvent::TestEnd(TestOutcome::new("Login", "A", TestStatus::Passed)),
        LifecycleEvent::RunEnd {
            status: RunStatus::Passed,
        },
    ]
}
