//! Review state repository
//!
//! Writes are compare-and-set on the `version` column; a write whose expected
//! version no longer matches affects no rows and reports a concurrent update.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppResult, SchedulingError},
    models::{ProblemSummary, ProgressStats, ReviewState, TrackedProblem},
    store::ProgressStore,
};

const STATE_COLUMNS: &str = "user_id, problem_id, ease_factor, interval_days, review_count, \
     times_solved, is_mastered, show_again, next_review_date, last_solved_at, version";

const TRACKED_SELECT: &str = r#"
    SELECT p.id, p.slug, p.title, p.difficulty, p.pattern, p.sequence_number,
           r.user_id, r.problem_id, r.ease_factor, r.interval_days, r.review_count,
           r.times_solved, r.is_mastered, r.show_again, r.next_review_date,
           r.last_solved_at, r.version
    FROM review_states r
    JOIN problems p ON p.id = r.problem_id
"#;

#[derive(FromRow)]
struct TrackedRow {
    #[sqlx(flatten)]
    problem: ProblemSummary,
    #[sqlx(flatten)]
    state: ReviewState,
}

impl From<TrackedRow> for TrackedProblem {
    fn from(row: TrackedRow) -> Self {
        Self {
            problem: row.problem,
            state: row.state,
        }
    }
}

#[derive(FromRow)]
struct StatsRow {
    total_problems: i64,
    solved_count: i64,
    mastered_count: i64,
    in_progress_count: i64,
    due_for_review: i64,
}

/// Repository for review state database operations
#[derive(Clone)]
pub struct ProgressRepository {
    pool: PgPool,
}

impl ProgressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(&self, state: &ReviewState) -> AppResult<Option<ReviewState>> {
        let query = format!(
            r#"
            INSERT INTO review_states (
                user_id, problem_id, ease_factor, interval_days, review_count,
                times_solved, is_mastered, show_again, next_review_date, last_solved_at, version
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 1)
            ON CONFLICT (user_id, problem_id) DO NOTHING
            RETURNING {STATE_COLUMNS}
            "#
        );

        let inserted = sqlx::query_as::<_, ReviewState>(&query)
            .bind(state.user_id)
            .bind(state.problem_id)
            .bind(state.ease_factor)
            .bind(state.interval_days)
            .bind(state.review_count)
            .bind(state.times_solved)
            .bind(state.is_mastered)
            .bind(state.show_again)
            .bind(state.next_review_date)
            .bind(state.last_solved_at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(inserted)
    }

    async fn update(&self, state: &ReviewState, expected_version: i64) -> AppResult<Option<ReviewState>> {
        let query = format!(
            r#"
            UPDATE review_states
            SET ease_factor = $3,
                interval_days = $4,
                review_count = $5,
                times_solved = $6,
                is_mastered = $7,
                show_again = $8,
                next_review_date = $9,
                last_solved_at = $10,
                version = version + 1,
                updated_at = NOW()
            WHERE user_id = $1 AND problem_id = $2 AND version = $11
            RETURNING {STATE_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, ReviewState>(&query)
            .bind(state.user_id)
            .bind(state.problem_id)
            .bind(state.ease_factor)
            .bind(state.interval_days)
            .bind(state.review_count)
            .bind(state.times_solved)
            .bind(state.is_mastered)
            .bind(state.show_again)
            .bind(state.next_review_date)
            .bind(state.last_solved_at)
            .bind(expected_version)
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }
}

#[async_trait]
impl ProgressStore for ProgressRepository {
    async fn get_review_state(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Option<ReviewState>> {
        let query = format!(
            "SELECT {STATE_COLUMNS} FROM review_states WHERE user_id = $1 AND problem_id = $2"
        );

        let state = sqlx::query_as::<_, ReviewState>(&query)
            .bind(user_id)
            .bind(problem_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(state)
    }

    async fn upsert_review_state(&self, state: &ReviewState, expected_version: i64) -> AppResult<ReviewState> {
        let written = if expected_version == 0 {
            self.insert(state).await?
        } else {
            self.update(state, expected_version).await?
        };

        written.ok_or_else(|| {
            tracing::debug!(
                user_id = %state.user_id,
                problem_id = %state.problem_id,
                expected_version,
                "Review state version check failed"
            );
            SchedulingError::ConcurrentUpdate.into()
        })
    }

    async fn list_due(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<TrackedProblem>> {
        let query = format!(
            r#"{TRACKED_SELECT}
            WHERE r.user_id = $1 AND r.is_mastered = FALSE AND r.next_review_date <= $2
            ORDER BY r.next_review_date, p.sequence_number
            "#
        );

        let rows = sqlx::query_as::<_, TrackedRow>(&query)
            .bind(user_id)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_unattempted(&self, user_id: Uuid) -> AppResult<Vec<ProblemSummary>> {
        let problems = sqlx::query_as::<_, ProblemSummary>(
            r#"
            SELECT p.id, p.slug, p.title, p.difficulty, p.pattern, p.sequence_number
            FROM problems p
            WHERE NOT EXISTS (
                SELECT 1 FROM review_states r
                WHERE r.problem_id = p.id AND r.user_id = $1
            )
            ORDER BY p.sequence_number
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(problems)
    }

    async fn list_mastered(&self, user_id: Uuid) -> AppResult<Vec<TrackedProblem>> {
        let query = format!(
            r#"{TRACKED_SELECT}
            WHERE r.user_id = $1 AND r.is_mastered = TRUE
            ORDER BY p.sequence_number
            "#
        );

        let rows = sqlx::query_as::<_, TrackedRow>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn stats(&self, user_id: Uuid, today: NaiveDate) -> AppResult<ProgressStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM problems) AS total_problems,
                COUNT(*) FILTER (WHERE times_solved > 0) AS solved_count,
                COUNT(*) FILTER (WHERE is_mastered) AS mastered_count,
                COUNT(*) FILTER (WHERE times_solved > 0 AND NOT is_mastered) AS in_progress_count,
                COUNT(*) FILTER (WHERE NOT is_mastered AND next_review_date <= $2) AS due_for_review
            FROM review_states
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let problems_by_difficulty = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT p.difficulty, COUNT(*)
            FROM review_states r
            JOIN problems p ON p.id = r.problem_id
            WHERE r.user_id = $1
            GROUP BY p.difficulty
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let problems_by_pattern = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT tag, COUNT(*)
            FROM review_states r
            JOIN problems p ON p.id = r.problem_id
            CROSS JOIN LATERAL unnest(p.pattern) AS tag
            WHERE r.user_id = $1
            GROUP BY tag
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProgressStats {
            total_problems: row.total_problems,
            solved_count: row.solved_count,
            mastered_count: row.mastered_count,
            in_progress_count: row.in_progress_count,
            unsolved_count: row.total_problems - row.solved_count,
            due_for_review: row.due_for_review,
            problems_by_difficulty: problems_by_difficulty.into_iter().collect(),
            problems_by_pattern: problems_by_pattern.into_iter().collect(),
        })
    }
}
