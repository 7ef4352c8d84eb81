//! Execution response DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    grading::{CaseReport, GradeSummary, RunReport, SubmitReport},
    models::FailedCase,
};

/// Quick run response
#[derive(Debug, Serialize)]
pub struct RunCodeResponse {
    pub success: bool,
    pub summary: GradeSummary,
    pub results: Vec<CaseReport>,
    pub runtime_ms: i64,
    pub error_detail: Option<String>,
}

impl From<RunReport> for RunCodeResponse {
    fn from(report: RunReport) -> Self {
        Self {
            success: report.error_detail.is_none() && report.summary.failed == 0,
            summary: report.summary,
            results: report.results,
            runtime_ms: report.runtime_ms,
            error_detail: report.error_detail,
        }
    }
}

/// Full submission response
#[derive(Debug, Serialize)]
pub struct SubmitCodeResponse {
    pub submission_id: Uuid,
    pub status: String,
    pub passed: bool,
    /// Timeout or runner failure; not a verdict on the code
    pub infrastructure_failure: bool,
    pub total_cases: i32,
    pub passed_count: i32,
    pub first_failure: Option<FailedCase>,
    pub runtime_ms: Option<i64>,
    pub error_detail: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Present only on a full pass; spend it on `POST /rate`
    pub grade_token: Option<Uuid>,
}

impl From<SubmitReport> for SubmitCodeResponse {
    fn from(report: SubmitReport) -> Self {
        let submission = report.submission;
        Self {
            submission_id: submission.id,
            status: submission.status.to_string(),
            passed: submission.passed(),
            infrastructure_failure: submission.status.is_infrastructure_failure(),
            total_cases: submission.total_cases,
            passed_count: submission.passed_count,
            first_failure: submission.first_failure,
            runtime_ms: submission.runtime_ms,
            error_detail: submission.error_detail,
            submitted_at: submission.submitted_at,
            grade_token: report.grade_token.map(|t| t.id),
        }
    }
}
