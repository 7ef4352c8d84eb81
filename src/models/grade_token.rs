//! Rating token model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ReviewState;

/// Proof that a submission passed every case; exchanged for exactly one rating
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub problem_id: Uuid,
    pub submission_id: Uuid,
    /// Review state version the token was issued against. Any later write
    /// to the row makes the token stale.
    pub state_version: i64,
    pub issued_at: DateTime<Utc>,
}

impl GradeToken {
    pub fn new(
        user_id: Uuid,
        problem_id: Uuid,
        submission_id: Uuid,
        state_version: i64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            problem_id,
            submission_id,
            state_version,
            issued_at,
        }
    }

    pub fn matches(&self, state: &ReviewState) -> bool {
        self.user_id == state.user_id
            && self.problem_id == state.problem_id
            && self.state_version == state.version
    }
}
