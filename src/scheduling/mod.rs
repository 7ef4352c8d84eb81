//! Spaced repetition
//!
//! [`engine`] holds the pure SM-2 transitions, [`ReviewService`] persists
//! them under optimistic versioning and [`DailySessionSelector`] builds the
//! daily session from stored state.

pub mod engine;
pub mod selector;
pub mod service;

pub use selector::{DailySessionSelector, TodaySession};
pub use service::ReviewService;
