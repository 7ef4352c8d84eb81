//! Domain models
//!
//! This module contains all domain models used throughout the application.

pub mod grade_token;
pub mod language;
pub mod problem;
pub mod review_state;
pub mod submission;
pub mod test_case;

pub use grade_token::*;
pub use language::*;
pub use problem::*;
pub use review_state::*;
pub use submission::*;
pub use test_case::*;
