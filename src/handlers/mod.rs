//! HTTP Request Handlers
//!
//! This module contains all HTTP request handlers organized by domain.

pub mod execution;
pub mod health;
pub mod progress;
pub mod submissions;

use axum::{middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    constants::API_BASE_PATH,
    middleware::{auth::auth_middleware, logging::logging_middleware},
    state::AppState,
};

/// Create all API routes
pub fn routes() -> Router<AppState> {
    let authenticated = Router::new()
        .merge(execution::routes())
        .merge(progress::routes())
        .nest("/submissions", submissions::routes())
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new().merge(health::routes()).merge(authenticated)
}

/// Full application router with the standard middleware stack
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest(API_BASE_PATH, routes())
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
