//! Submission history handlers

mod handler;
pub mod response;

pub use handler::*;
pub use response::*;

use axum::{routing::get, Router};

use crate::state::AppState;

/// Submission routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/{problem_slug}", get(handler::list_submissions))
}
