//! Submission response DTOs

use serde::Serialize;

use crate::models::Submission;

/// Submission history for one problem, newest first
#[derive(Debug, Serialize)]
pub struct SubmissionsListResponse {
    pub submissions: Vec<Submission>,
    pub total: usize,
}
