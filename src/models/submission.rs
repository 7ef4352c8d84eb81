//! Submission model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::submission_statuses;

use super::Language;

/// Immutable record of one full-suite grading run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    #[serde(skip_serializing)]
    pub code: String,
    pub language: Language,
    pub status: SubmissionStatus,
    pub total_cases: i32,
    pub passed_count: i32,
    /// Only the first failing case is itemized
    pub first_failure: Option<FailedCase>,
    pub runtime_ms: Option<i64>,
    /// Program-level error output (crash before any case ran)
    pub error_detail: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn passed(&self) -> bool {
        self.status == SubmissionStatus::Passed
    }
}

/// Final status of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Every case matched
    Passed,
    /// Wrong output, case exception, or crashed program
    Failed,
    /// Sandbox wall-clock ceiling hit
    Timeout,
    /// Runner could not produce a usable result after the retry
    RunnerUnavailable,
}

impl SubmissionStatus {
    /// Get status as stored string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => submission_statuses::PASSED,
            Self::Failed => submission_statuses::FAILED,
            Self::Timeout => submission_statuses::TIMEOUT,
            Self::RunnerUnavailable => submission_statuses::RUNNER_UNAVAILABLE,
        }
    }

    /// Parse status from stored string
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            submission_statuses::PASSED => Some(Self::Passed),
            submission_statuses::FAILED => Some(Self::Failed),
            submission_statuses::TIMEOUT => Some(Self::Timeout),
            submission_statuses::RUNNER_UNAVAILABLE => Some(Self::RunnerUnavailable),
            _ => None,
        }
    }

    /// Infrastructure failures never score and never lead to a rating prompt
    pub fn is_infrastructure_failure(&self) -> bool {
        matches!(self, Self::Timeout | Self::RunnerUnavailable)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detail of the first failing case of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCase {
    /// Zero-based position in the ordered case list
    pub index: i32,
    pub input: Value,
    pub expected: Value,
    /// Returned value, absent when the case raised
    pub actual: Option<Value>,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_and_classification() {
        for status in [
            SubmissionStatus::Passed,
            SubmissionStatus::Failed,
            SubmissionStatus::Timeout,
            SubmissionStatus::RunnerUnavailable,
        ] {
            assert_eq!(SubmissionStatus::from_db_str(status.as_str()), Some(status));
        }

        assert!(SubmissionStatus::Timeout.is_infrastructure_failure());
        assert!(!SubmissionStatus::Failed.is_infrastructure_failure());
        assert_eq!(SubmissionStatus::from_db_str("accepted"), None);
    }
}
