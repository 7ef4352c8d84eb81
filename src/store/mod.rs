//! Storage seams
//!
//! The grading engine, scheduling service and session selector depend only on
//! these traits. Postgres and Redis back them in production
//! ([`crate::db::repositories`], [`RedisTokenStore`]); [`memory`] backs them in
//! tests and local runs.

pub mod memory;
pub mod redis_tokens;

pub use memory::{MemoryStore, MemoryTokenStore};
pub use redis_tokens::RedisTokenStore;

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{GradeToken, ProblemDetail, ProblemSummary, ProgressStats, ReviewState, Submission, TrackedProblem},
};

/// Read access to the problem catalogue
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Problem with its languages and ordered test cases
    async fn get_problem(&self, slug: &str) -> AppResult<Option<ProblemDetail>>;
}

/// Persistence for review states
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_review_state(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Option<ReviewState>>;

    /// Write `state` if the stored version still equals `expected_version`.
    ///
    /// `expected_version == 0` means the row must not exist yet. On success the
    /// returned state carries the new version; on a mismatch the call fails
    /// with `SchedulingError::ConcurrentUpdate` and nothing is written.
    async fn upsert_review_state(&self, state: &ReviewState, expected_version: i64) -> AppResult<ReviewState>;

    /// Non-mastered rows with `next_review_date <= today`, in any order
    async fn list_due(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<TrackedProblem>>;

    /// Problems the user has no review state for
    async fn list_unattempted(&self, user_id: Uuid) -> AppResult<Vec<ProblemSummary>>;

    async fn list_mastered(&self, user_id: Uuid) -> AppResult<Vec<TrackedProblem>>;

    async fn stats(&self, user_id: Uuid, today: NaiveDate) -> AppResult<ProgressStats>;
}

/// Append-only submission log
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn record(&self, submission: &Submission) -> AppResult<()>;

    /// Most recent first
    async fn list_for_problem(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Vec<Submission>>;
}

/// Short-lived rating tokens
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn issue(&self, token: &GradeToken, ttl: Duration) -> AppResult<()>;

    /// Look up a live token without spending it
    async fn peek(&self, id: Uuid) -> AppResult<Option<GradeToken>>;

    /// Remove and return a live token; `None` if it was already spent or expired
    async fn consume(&self, id: Uuid) -> AppResult<Option<GradeToken>>;
}
