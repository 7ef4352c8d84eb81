//! Submission repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{FailedCase, Language, Submission, SubmissionStatus},
    store::SubmissionStore,
};

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    user_id: Uuid,
    problem_id: Uuid,
    code: String,
    language: String,
    status: String,
    total_cases: i32,
    passed_count: i32,
    first_failure: Option<Json<FailedCase>>,
    runtime_ms: Option<i64>,
    error_detail: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl TryFrom<SubmissionRow> for Submission {
    type Error = AppError;

    fn try_from(row: SubmissionRow) -> Result<Self, Self::Error> {
        let status = SubmissionStatus::from_db_str(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown submission status '{}'", row.status))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            problem_id: row.problem_id,
            code: row.code,
            language: row.language.parse::<Language>()?,
            status,
            total_cases: row.total_cases,
            passed_count: row.passed_count,
            first_failure: row.first_failure.map(|f| f.0),
            runtime_ms: row.runtime_ms,
            error_detail: row.error_detail,
            submitted_at: row.submitted_at,
        })
    }
}

/// Repository for submission database operations
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    async fn record(&self, submission: &Submission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO submissions (
                id, user_id, problem_id, code, language, status, total_cases,
                passed_count, first_failure, runtime_ms, error_detail, submitted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(submission.problem_id)
        .bind(&submission.code)
        .bind(submission.language.as_str())
        .bind(submission.status.as_str())
        .bind(submission.total_cases)
        .bind(submission.passed_count)
        .bind(submission.first_failure.as_ref().map(Json))
        .bind(submission.runtime_ms)
        .bind(&submission.error_detail)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_problem(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Vec<Submission>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, user_id, problem_id, code, language, status, total_cases,
                   passed_count, first_failure, runtime_ms, error_detail, submitted_at
            FROM submissions
            WHERE user_id = $1 AND problem_id = $2
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(user_id)
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Submission::try_from).collect()
    }
}
