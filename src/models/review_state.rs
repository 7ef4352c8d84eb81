//! Review state model
//!
//! One row per (user, problem) pair. Rows are created by the first passing
//! submission and afterwards changed only by scheduling transitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{constants::DEFAULT_EASE_FACTOR, error::SchedulingError};

/// Per-user, per-problem spaced repetition state
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ReviewState {
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub review_count: i32,
    pub times_solved: i32,
    pub is_mastered: bool,
    /// Set when a mastered item is put back in rotation; the next rating
    /// then follows the fixed first-review rules
    pub show_again: bool,
    pub next_review_date: Option<NaiveDate>,
    pub last_solved_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version; 0 means not yet persisted
    #[serde(skip)]
    pub version: i64,
}

impl ReviewState {
    /// Fresh, unpersisted state for a pair
    pub fn new(user_id: Uuid, problem_id: Uuid) -> Self {
        Self {
            user_id,
            problem_id,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0,
            review_count: 0,
            times_solved: 0,
            is_mastered: false,
            show_again: false,
            next_review_date: None,
            last_solved_at: None,
            version: 0,
        }
    }

    /// Whether the next rating uses the fixed first-review intervals
    pub fn is_first_review(&self) -> bool {
        self.review_count == 0 || self.show_again
    }

    /// Whether the item is due on `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        !self.is_mastered && self.next_review_date.is_some_and(|d| d <= today)
    }
}

/// Self-assessed difficulty after a passing submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Mastered,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Mastered => "mastered",
        }
    }
}

impl FromStr for Rating {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Self::Again),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "mastered" => Ok(Self::Mastered),
            other => Err(SchedulingError::InvalidRating(other.to_string())),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A review state joined with its problem metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedProblem {
    pub problem: super::ProblemSummary,
    pub state: ReviewState,
}

/// Aggregate progress counters for one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressStats {
    pub total_problems: i64,
    pub solved_count: i64,
    pub mastered_count: i64,
    pub in_progress_count: i64,
    pub unsolved_count: i64,
    pub due_for_review: i64,
    /// Attempted problems per difficulty
    pub problems_by_difficulty: BTreeMap<String, i64>,
    /// Attempted problems per pattern tag; a problem counts once per tag
    pub problems_by_pattern: BTreeMap<String, i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_rejects_unknown_values() {
        assert_eq!("good".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!(
            "Good".parse::<Rating>(),
            Err(SchedulingError::InvalidRating("Good".to_string()))
        );
        assert!("easy".parse::<Rating>().is_err());
    }

    #[test]
    fn test_is_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let mut state = ReviewState::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(!state.is_due(today));

        state.next_review_date = Some(today);
        assert!(state.is_due(today));

        state.next_review_date = today.succ_opt();
        assert!(!state.is_due(today));
    }
}
