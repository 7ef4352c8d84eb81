//! Custom error types and handling
//!
//! This module defines the domain error taxonomy (harness, grading,
//! scheduling), the application-wide error type, and its conversion to
//! HTTP responses for the Axum framework.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failures while building the wrapper program
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HarnessError {
    /// The named function is not defined in the submitted source
    #[error("Entry point `{0}` not found in submitted code")]
    MissingEntryPoint(String),

    #[error("Invalid function name in problem signature: {0}")]
    InvalidFunctionName(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A single case returned a value that could not be encoded as JSON
    #[error("Return value is not JSON-serializable: {0}")]
    SerializationError(String),
}

/// Infrastructure failures of a grading run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GradingError {
    #[error("Execution exceeded the {0}s wall-clock limit")]
    Timeout(u64),

    #[error("Code runner unavailable: {0}")]
    RunnerUnavailable(String),
}

/// Scheduling contract violations; callers must retry or fix the request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Review state was modified concurrently; retry the request")]
    ConcurrentUpdate,

    #[error("Problem is not mastered")]
    NotMastered,

    #[error("Rating token is invalid, expired, or already used")]
    InvalidToken,
}

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    // Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    // Resource errors
    #[error("Not found: {0}")]
    NotFound(String),

    // Domain errors
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Grading(#[from] GradingError),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    // Database errors
    #[error("Database error: {0}")]
    Database(String),

    // External service errors
    #[error("Docker error: {0}")]
    Docker(String),

    #[error("Redis error: {0}")]
    Redis(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Harness(HarnessError::MissingEntryPoint(_)) => "MISSING_ENTRY_POINT",
            Self::Harness(HarnessError::InvalidFunctionName(_)) => "INVALID_FUNCTION_NAME",
            Self::Harness(HarnessError::UnsupportedLanguage(_)) => "UNSUPPORTED_LANGUAGE",
            Self::Harness(HarnessError::SerializationError(_)) => "SERIALIZATION_ERROR",
            Self::Grading(GradingError::Timeout(_)) => "EXECUTION_TIMEOUT",
            Self::Grading(GradingError::RunnerUnavailable(_)) => "RUNNER_UNAVAILABLE",
            Self::Scheduling(SchedulingError::InvalidRating(_)) => "INVALID_RATING",
            Self::Scheduling(SchedulingError::ConcurrentUpdate) => "CONCURRENT_UPDATE",
            Self::Scheduling(SchedulingError::NotMastered) => "NOT_MASTERED",
            Self::Scheduling(SchedulingError::InvalidToken) => "INVALID_RATING_TOKEN",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Docker(_) => "DOCKER_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Harness(HarnessError::InvalidFunctionName(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Harness(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Grading(GradingError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Grading(GradingError::RunnerUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Scheduling(SchedulingError::InvalidRating(_)) => StatusCode::BAD_REQUEST,
            Self::Scheduling(SchedulingError::ConcurrentUpdate) => StatusCode::CONFLICT,
            Self::Scheduling(SchedulingError::NotMastered) => StatusCode::BAD_REQUEST,
            Self::Scheduling(SchedulingError::InvalidToken) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Docker(_) | Self::Redis(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors but don't expose details to clients
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "A database error occurred".to_string()
            }
            AppError::Redis(e) | AppError::Docker(e) => {
                tracing::error!("Backend service error: {}", e);
                "A backend service error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<bollard::errors::Error> for AppError {
    fn from(err: bollard::errors::Error) -> Self {
        AppError::Docker(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_errors_are_distinct_from_rating_errors() {
        let timeout = AppError::from(GradingError::Timeout(10));
        assert_eq!(timeout.error_code(), "EXECUTION_TIMEOUT");
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);

        let conflict = AppError::from(SchedulingError::ConcurrentUpdate);
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_missing_entry_point_message() {
        let err = AppError::from(HarnessError::MissingEntryPoint("twoSum".to_string()));
        assert_eq!(err.error_code(), "MISSING_ENTRY_POINT");
        assert!(err.to_string().contains("twoSum"));
    }
}
