//! Progress request DTOs

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Rate request
#[derive(Debug, Deserialize, Validate)]
pub struct RateRequest {
    /// Token returned by a passing submission
    pub grade_token: Uuid,

    /// One of `again`, `hard`, `good`, `mastered`
    #[validate(length(min = 1, max = 16))]
    pub rating: String,
}
