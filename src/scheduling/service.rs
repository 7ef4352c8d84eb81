//! Persisted scheduling operations
//!
//! Every write is a read-modify-write of one (user, problem) row, committed
//! only if the row's version is unchanged since the read.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, SchedulingError},
    models::{ProgressStats, Rating, ReviewState, TrackedProblem},
    store::{ProgressStore, TokenStore},
    utils::Clock,
};

use super::engine;

/// Applies ratings and re-queues mastered problems
pub struct ReviewService {
    progress: Arc<dyn ProgressStore>,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl ReviewService {
    pub fn new(progress: Arc<dyn ProgressStore>, tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            progress,
            tokens,
            clock,
        }
    }

    /// Rate the problem a grade token was issued for.
    ///
    /// The token is bound to the state version it was issued against and is
    /// taken from the store before the write, so it yields at most one
    /// transition. A rating that fails validation leaves it unspent.
    pub async fn rate(&self, user_id: Uuid, token_id: Uuid, rating: &str) -> AppResult<ReviewState> {
        let rating: Rating = rating.parse()?;

        let token = self
            .tokens
            .peek(token_id)
            .await?
            .filter(|t| t.user_id == user_id)
            .ok_or(SchedulingError::InvalidToken)?;

        let current = self
            .progress
            .get_review_state(user_id, token.problem_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Review state not found".to_string()))?;

        if !token.matches(&current) {
            tracing::debug!(
                token_id = %token_id,
                token_version = token.state_version,
                state_version = current.version,
                "Grade token is stale"
            );
            return Err(SchedulingError::InvalidToken.into());
        }

        if self.tokens.consume(token_id).await?.is_none() {
            tracing::debug!(token_id = %token_id, "Grade token already spent");
            return Err(SchedulingError::InvalidToken.into());
        }

        let next = engine::rate(&current, rating, self.clock.today());
        debug_assert!(engine::is_consistent(&next));
        let saved = self
            .progress
            .upsert_review_state(&next, current.version)
            .await?;

        tracing::info!(
            user_id = %user_id,
            problem_id = %saved.problem_id,
            rating = %rating,
            interval_days = saved.interval_days,
            ease_factor = saved.ease_factor,
            is_mastered = saved.is_mastered,
            "Review rated"
        );

        Ok(saved)
    }

    /// Record a passing submission, creating the row on first solve
    pub async fn record_solve(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<ReviewState> {
        let current = self.progress.get_review_state(user_id, problem_id).await?;
        let expected_version = current.as_ref().map_or(0, |s| s.version);

        let next = engine::record_solve(current.as_ref(), user_id, problem_id, self.clock.now());
        let saved = self
            .progress
            .upsert_review_state(&next, expected_version)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            problem_id = %problem_id,
            times_solved = saved.times_solved,
            created = expected_version == 0,
            "Solve recorded"
        );

        Ok(saved)
    }

    /// Put a mastered problem back into rotation, due today
    pub async fn show_again(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<ReviewState> {
        let current = self
            .progress
            .get_review_state(user_id, problem_id)
            .await?
            .ok_or(SchedulingError::NotMastered)?;

        let next = engine::show_again(&current, self.clock.today())?;
        let saved = self
            .progress
            .upsert_review_state(&next, current.version)
            .await?;

        tracing::info!(user_id = %user_id, problem_id = %problem_id, "Mastered problem re-queued");

        Ok(saved)
    }

    pub async fn mastered(&self, user_id: Uuid) -> AppResult<Vec<TrackedProblem>> {
        let mut mastered = self.progress.list_mastered(user_id).await?;
        mastered.sort_by_key(|t| t.problem.sequence_number);
        Ok(mastered)
    }

    pub async fn stats(&self, user_id: Uuid) -> AppResult<ProgressStats> {
        self.progress.stats(user_id, self.clock.today()).await
    }
}
