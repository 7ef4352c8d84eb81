//! Application state management
//!
//! This module contains the shared application state that is passed
//! to all request handlers via Axum's State extractor.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    grading::GradingEngine,
    scheduling::{DailySessionSelector, ReviewService},
    utils::Clock,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

/// Inner state (wrapped in Arc for cheap cloning)
struct AppStateInner {
    /// Database pool, when running against Postgres
    db: Option<PgPool>,

    grading: Arc<GradingEngine>,

    reviews: Arc<ReviewService>,

    selector: DailySessionSelector,

    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state
    pub fn new(
        db: Option<PgPool>,
        grading: Arc<GradingEngine>,
        reviews: Arc<ReviewService>,
        selector: DailySessionSelector,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                grading,
                reviews,
                selector,
                clock,
            }),
        }
    }

    /// Get the database pool, if one is configured
    pub fn db(&self) -> Option<&PgPool> {
        self.inner.db.as_ref()
    }

    pub fn grading(&self) -> &GradingEngine {
        &self.inner.grading
    }

    pub fn reviews(&self) -> &ReviewService {
        &self.inner.reviews
    }

    pub fn selector(&self) -> &DailySessionSelector {
        &self.inner.selector
    }

    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }
}
