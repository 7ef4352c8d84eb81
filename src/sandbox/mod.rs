//! Execution adapter
//!
//! The grading engine hands a rendered harness program plus its stdin to an
//! [`ExecutionAdapter`], which runs it in isolation and reports raw output.
//! Exactly one adapter call is made per grading operation.

pub mod docker;

pub use docker::DockerExecutor;

use async_trait::async_trait;

use crate::models::Language;

/// One program to execute in the sandbox
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub source: String,
    pub language: Language,
    pub stdin: String,
}

/// Raw result of a sandbox execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
    /// The wall-clock ceiling was hit and the program was killed
    pub timed_out: bool,
    pub wall_time_ms: i64,
}

/// Infrastructure failures of the sandbox itself
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("docker error: {0}")]
    Docker(String),

    #[error("sandbox setup failed: {0}")]
    Setup(String),
}

impl From<bollard::errors::Error> for SandboxError {
    fn from(err: bollard::errors::Error) -> Self {
        SandboxError::Docker(err.to_string())
    }
}

/// Runs one program in an isolated environment
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExecutionAdapter: Send + Sync {
    /// Execute `request`, enforcing the adapter's wall-clock ceiling
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionOutput, SandboxError>;
}
