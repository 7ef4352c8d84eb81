//! Daily session selection

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    constants::DAILY_REVIEW_LIMIT,
    error::AppResult,
    models::{ProblemSummary, TrackedProblem},
    store::ProgressStore,
};

/// What a user should work on today
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodaySession {
    pub reviews: Vec<TrackedProblem>,
    pub new_problem: Option<ProblemSummary>,
}

/// Picks up to two due reviews plus the next unseen problem
pub struct DailySessionSelector {
    progress: Arc<dyn ProgressStore>,
}

impl DailySessionSelector {
    pub fn new(progress: Arc<dyn ProgressStore>) -> Self {
        Self { progress }
    }

    /// Session for `user_id` on `today`. Reads only; the same stored state
    /// and date always yield the same session.
    pub async fn select_today(&self, user_id: Uuid, today: NaiveDate) -> AppResult<TodaySession> {
        let due = self.progress.list_due(user_id, today).await?;
        let unattempted = self.progress.list_unattempted(user_id).await?;

        let session = TodaySession {
            reviews: pick_reviews(due, today),
            new_problem: unattempted.into_iter().min_by_key(|p| p.sequence_number),
        };

        tracing::debug!(
            user_id = %user_id,
            %today,
            reviews = session.reviews.len(),
            has_new_problem = session.new_problem.is_some(),
            "Selected daily session"
        );

        Ok(session)
    }
}

fn pick_reviews(mut due: Vec<TrackedProblem>, today: NaiveDate) -> Vec<TrackedProblem> {
    due.retain(|t| t.state.is_due(today));
    due.sort_by_key(|t| (t.state.next_review_date, t.problem.sequence_number));
    due.truncate(DAILY_REVIEW_LIMIT);
    due
}
