//! acodeaday - Daily Coding Practice Engine
//!
//! This library provides the core of acodeaday: grading function-style
//! solutions in a sandbox and scheduling reviews with SM-2 spaced repetition.
//!
//! # Features
//!
//! - Python and JavaScript harnesses over a JSON stdin/stdout protocol
//! - One isolated Docker container per grading run
//! - SM-2 review scheduling with optimistic versioning
//! - Daily sessions of up to two reviews plus one new problem
//!
//! # Architecture
//!
//! The application follows a layered architecture:
//! - **Handlers**: HTTP request handlers (thin layer)
//! - **Grading / Scheduling**: Business logic
//! - **Store / Repositories**: Persistence behind traits
//! - **Models**: Domain models

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod grading;
pub mod handlers;
pub mod harness;
pub mod middleware;
pub mod models;
pub mod sandbox;
pub mod scheduling;
pub mod state;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
