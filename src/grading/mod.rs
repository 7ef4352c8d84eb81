//! Grading
//!
//! Quick runs execute the visible test-case prefix for feedback only. Full
//! submissions run every case, persist one submission and, when all cases
//! pass, hand back a grade token that unlocks a single rating.

pub mod compare;
pub mod engine;

pub use compare::json_eq;
pub use engine::{CaseReport, GradeSummary, GradingEngine, GradingSettings, RunReport, SubmitReport};
