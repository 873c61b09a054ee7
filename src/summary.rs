//! Structured end-of-run statistics.

use crate::lifecycle::{RunStatus, SuiteTotals, TestStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSummary {
    pub name: String,
    pub totals: SuiteTotals,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedTest {
    pub suite: String,
    pub test: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub totals: SuiteTotals,
    /// Suites with at least one finished test, in discovery order.
    pub suites: Vec<SuiteSummary>,
    pub failures: Vec<FailedTest>,
}

impl RunSummary {
    pub fn suite(&self, name: &str) -> Option<&SuiteSummary> {
        self.suites.iter().find(|suite| suite.name == name)
    }

    pub const fn all_passed(&self) -> bool {
        self.totals.failed == 0
    }

    /// Percentage of executed (non-skipped) tests that passed.
    pub fn pass_rate(&self) -> Option<f64> {
        let executed = self.totals.passed + self.totals.failed;
        if executed == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.totals.passed as f64 * 100.0 / executed as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(passed: usize, failed: usize, skipped: usize) -> RunSummary {
        let now = Utc::now();
        RunSummary {
            status: RunStatus::Passed,
            started_at: now,
            ended_at: now,
            duration_ms: 0,
            totals: SuiteTotals {
                passed,
                failed,
                skipped,
                total: passed + failed + skipped,
            },
            suites: Vec::new(),
            failures: Vec::new(),
        }
    }

    #[test]
    fn pass_rate_ignores_skips() {
        let rate = summary(3, 1, 10).pass_rate().unwrap();
        assert!((rate - 75.0).abs() < f64::EPSILON);
        assert_eq!(summary(0, 0, 2).pass_rate(), None);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(summary(1, 0, 0)).unwrap();
        assert_eq!(json["durationMs"], 0);
        assert_eq!(json["totals"]["passed"], 1);
        assert_eq!(json["status"], "passed");
    }
}
