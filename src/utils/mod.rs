//! Utility functions

pub mod time;
pub mod validation;

pub use time::{Clock, FixedClock, SystemClock};
pub use validation::{is_identifier, validate_slug};
