//! Progress handler implementations

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    models::ProgressStats,
    state::AppState,
};

use super::{
    request::RateRequest,
    response::{MasteredListResponse, ReviewStateResponse, TodayResponse},
};

/// Today's reviews and next new problem
pub async fn get_today(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<Json<TodayResponse>> {
    let today = state.clock().today();
    let session = state.selector().select_today(auth_user.id, today).await?;

    Ok(Json(TodayResponse::new(today, session)))
}

/// Rate a problem after a passing submission
pub async fn rate_problem(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<RateRequest>,
) -> AppResult<Json<ReviewStateResponse>> {
    payload.validate()?;

    let review = state
        .reviews()
        .rate(auth_user.id, payload.grade_token, &payload.rating)
        .await?;

    Ok(Json(review.into()))
}

/// Aggregate progress counters
pub async fn get_progress(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<Json<ProgressStats>> {
    let stats = state.reviews().stats(auth_user.id).await?;
    Ok(Json(stats))
}

/// Problems currently out of rotation
pub async fn list_mastered(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> AppResult<Json<MasteredListResponse>> {
    let mastered = state.reviews().mastered(auth_user.id).await?;

    Ok(Json(MasteredListResponse {
        total: mastered.len(),
        mastered_problems: mastered.into_iter().map(Into::into).collect(),
    }))
}

/// Put a mastered problem back into rotation
pub async fn show_again(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(problem_id): Path<Uuid>,
) -> AppResult<Json<ReviewStateResponse>> {
    let review = state.reviews().show_again(auth_user.id, problem_id).await?;
    Ok(Json(review.into()))
}
