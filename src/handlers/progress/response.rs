//! Progress response DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    models::{ProblemSummary, ReviewState, TrackedProblem},
    scheduling::TodaySession,
};

/// Schedule of one problem after a change
#[derive(Debug, Serialize)]
pub struct ReviewStateResponse {
    pub problem_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub review_count: i32,
    pub times_solved: i32,
    pub is_mastered: bool,
    pub show_again: bool,
    pub next_review_date: Option<NaiveDate>,
    pub last_solved_at: Option<DateTime<Utc>>,
}

impl From<ReviewState> for ReviewStateResponse {
    fn from(state: ReviewState) -> Self {
        Self {
            problem_id: state.problem_id,
            ease_factor: state.ease_factor,
            interval_days: state.interval_days,
            review_count: state.review_count,
            times_solved: state.times_solved,
            is_mastered: state.is_mastered,
            show_again: state.show_again,
            next_review_date: state.next_review_date,
            last_solved_at: state.last_solved_at,
        }
    }
}

/// Problem with its schedule
#[derive(Debug, Serialize)]
pub struct TrackedProblemResponse {
    pub problem: ProblemSummary,
    pub schedule: ReviewStateResponse,
}

impl From<TrackedProblem> for TrackedProblemResponse {
    fn from(tracked: TrackedProblem) -> Self {
        Self {
            problem: tracked.problem,
            schedule: tracked.state.into(),
        }
    }
}

/// Today's session
#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub date: NaiveDate,
    pub review_problems: Vec<TrackedProblemResponse>,
    pub new_problem: Option<ProblemSummary>,
}

impl TodayResponse {
    pub fn new(date: NaiveDate, session: TodaySession) -> Self {
        Self {
            date,
            review_problems: session.reviews.into_iter().map(Into::into).collect(),
            new_problem: session.new_problem,
        }
    }
}

/// Mastered problems list
#[derive(Debug, Serialize)]
pub struct MasteredListResponse {
    pub mastered_problems: Vec<TrackedProblemResponse>,
    pub total: usize,
}
