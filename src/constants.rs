//! Application-wide constants
//!
//! This module contains all constant values used throughout the application.
//! Constants are grouped by their purpose for better organization.

// =============================================================================
// SERVER DEFAULTS
// =============================================================================

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Header carrying the caller identity set by the fronting auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

// =============================================================================
// DATABASE DEFAULTS
// =============================================================================

/// Default maximum database connections in the pool
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

// =============================================================================
// SANDBOX DEFAULTS
// =============================================================================

/// Wall-clock ceiling for one sandbox execution, in seconds
pub const DEFAULT_EXECUTION_TIMEOUT_SECONDS: u64 = 10;

/// Default memory limit in megabytes
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 256;

/// Maximum number of processes inside a sandbox container
pub const DEFAULT_PIDS_LIMIT: i64 = 64;

/// Exit status produced by coreutils `timeout` when the limit is hit
pub const TIMEOUT_EXIT_CODE: i64 = 124;

/// Exit statuses from `timeout` or the shell meaning the program never started
pub const RUNNER_FAILURE_EXIT_CODES: &[i64] = &[125, 126, 127];

/// Extra time allowed on top of the execution timeout for container
/// creation and teardown before the call is abandoned
pub const SANDBOX_OVERHEAD_SECONDS: u64 = 20;

/// Container images for each language
pub mod container_images {
    pub const PYTHON: &str = "python:3.12-slim";
    pub const JAVASCRIPT: &str = "node:20-slim";
}

// =============================================================================
// GRADING DEFAULTS
// =============================================================================

/// Number of leading test cases exposed to quick runs
pub const DEFAULT_VISIBLE_CASE_COUNT: usize = 3;

/// Backoff before the single retry of a failed runner call, in milliseconds
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Lifetime of a rating token issued by a passing submission, in seconds
pub const DEFAULT_GRADE_TOKEN_TTL_SECONDS: u64 = 900;

/// Key marking a per-case error entry in the harness output array
pub const HARNESS_ERROR_KEY: &str = "__error__";

/// Message prefix the harnesses use for unserializable return values
pub const SERIALIZATION_ERROR_PREFIX: &str = "SerializationError:";

/// Maximum stderr excerpt kept on a submission record
pub const MAX_STDERR_EXCERPT: usize = 2000;

/// Redis key prefix for rating tokens
pub const GRADE_TOKEN_KEY_PREFIX: &str = "grade_token:";

// =============================================================================
// SCHEDULING
// =============================================================================

/// Ease factor assigned to new and re-shown items
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound of the ease factor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease penalty for an `again` rating
pub const AGAIN_EASE_PENALTY: f64 = 0.2;

/// Ease penalty for a `hard` rating
pub const HARD_EASE_PENALTY: f64 = 0.15;

/// Interval multiplier for a `hard` rating
pub const HARD_INTERVAL_MULTIPLIER: f64 = 1.2;

/// Fixed first-review interval for `good`
pub const FIRST_GOOD_INTERVAL_DAYS: i32 = 3;

/// Fixed first-review interval for `hard`, and the `again` interval
pub const SHORT_INTERVAL_DAYS: i32 = 1;

/// Intervals at or beyond this many days graduate the item to mastered
pub const MASTERY_INTERVAL_DAYS: i32 = 30;

/// Maximum reviews offered by the daily session
pub const DAILY_REVIEW_LIMIT: usize = 2;

// =============================================================================
// SUPPORTED LANGUAGES
// =============================================================================

/// Language identifiers
pub mod languages {
    pub const PYTHON: &str = "python";
    pub const JAVASCRIPT: &str = "javascript";
}

/// Submission statuses as stored
pub mod submission_statuses {
    pub const PASSED: &str = "passed";
    pub const FAILED: &str = "failed";
    pub const TIMEOUT: &str = "timeout";
    pub const RUNNER_UNAVAILABLE: &str = "runner_unavailable";
}

// =============================================================================
// API
// =============================================================================

/// API base path
pub const API_BASE_PATH: &str = "/api/v1";
