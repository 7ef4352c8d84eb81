//! Submission handler implementations

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{error::AppResult, middleware::auth::AuthenticatedUser, state::AppState};

use super::response::SubmissionsListResponse;

/// List the caller's submissions for a problem
pub async fn list_submissions(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(problem_slug): Path<String>,
) -> AppResult<Json<SubmissionsListResponse>> {
    let submissions = state.grading().history(auth_user.id, &problem_slug).await?;

    Ok(Json(SubmissionsListResponse {
        total: submissions.len(),
        submissions,
    }))
}
