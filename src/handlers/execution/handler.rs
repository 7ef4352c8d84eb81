//! Execution handler implementations

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    error::AppResult,
    middleware::auth::AuthenticatedUser,
    models::Language,
    state::AppState,
};

use super::{
    request::ExecuteCodeRequest,
    response::{RunCodeResponse, SubmitCodeResponse},
};

/// Run the visible test cases without recording anything
pub async fn run_code(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Json(payload): Json<ExecuteCodeRequest>,
) -> AppResult<Json<RunCodeResponse>> {
    payload.validate()?;
    let language: Language = payload.language.parse()?;

    let report = state
        .grading()
        .run_quick(&payload.code, language, &payload.problem_slug)
        .await?;

    Ok(Json(report.into()))
}

/// Grade against every test case and record the submission
pub async fn submit_code(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Json(payload): Json<ExecuteCodeRequest>,
) -> AppResult<Json<SubmitCodeResponse>> {
    payload.validate()?;
    let language: Language = payload.language.parse()?;

    let report = state
        .grading()
        .submit(&payload.code, language, &payload.problem_slug, auth_user.id)
        .await?;

    Ok(Json(report.into()))
}
