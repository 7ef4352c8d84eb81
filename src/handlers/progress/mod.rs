//! Progress and review handlers

mod handler;
pub mod request;
pub mod response;

pub use handler::*;
pub use request::*;
pub use response::*;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Progress routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/today", get(handler::get_today))
        .route("/rate", post(handler::rate_problem))
        .route("/progress", get(handler::get_progress))
        .route("/mastered", get(handler::list_mastered))
        .route("/mastered/{problem_id}/show-again", post(handler::show_again))
}
