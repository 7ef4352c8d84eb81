//! Application configuration management
//!
//! This module handles loading and validating configuration from environment variables.
//! All configuration is loaded at startup and validated before the application runs.

use std::env;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::constants::{
    container_images, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_EXECUTION_TIMEOUT_SECONDS,
    DEFAULT_GRADE_TOKEN_TTL_SECONDS, DEFAULT_MEMORY_LIMIT_MB, DEFAULT_PIDS_LIMIT,
    DEFAULT_RETRY_BACKOFF_MS, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
    DEFAULT_VISIBLE_CASE_COUNT,
};

/// Global application configuration (lazily initialized)
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub sandbox: SandboxConfig,
    pub grading: GradingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
}

/// Sandbox (Docker) configuration
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub python_image: String,
    pub javascript_image: String,
    pub memory_limit_mb: u64,
    pub pids_limit: i64,
    /// Hard wall-clock ceiling for one execution
    pub timeout_seconds: u64,
}

/// Grading policy configuration
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Leading test cases used by quick runs
    pub visible_case_count: usize,
    pub retry_backoff_ms: u64,
    pub token_ttl_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env()?,
            sandbox: SandboxConfig::from_env()?,
            grading: GradingConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            port: parse_var("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()?,
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_DATABASE_MAX_CONNECTIONS)?,
        })
    }
}

impl RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        })
    }
}

impl SandboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            python_image: env::var("SANDBOX_PYTHON_IMAGE")
                .unwrap_or_else(|_| container_images::PYTHON.to_string()),
            javascript_image: env::var("SANDBOX_JAVASCRIPT_IMAGE")
                .unwrap_or_else(|_| container_images::JAVASCRIPT.to_string()),
            memory_limit_mb: parse_var("SANDBOX_MEMORY_LIMIT_MB", DEFAULT_MEMORY_LIMIT_MB)?,
            pids_limit: parse_var("SANDBOX_PIDS_LIMIT", DEFAULT_PIDS_LIMIT)?,
            timeout_seconds: parse_var("EXECUTION_TIMEOUT_SECONDS", DEFAULT_EXECUTION_TIMEOUT_SECONDS)?,
        })
    }

    /// Wall-clock ceiling as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_image: container_images::PYTHON.to_string(),
            javascript_image: container_images::JAVASCRIPT.to_string(),
            memory_limit_mb: DEFAULT_MEMORY_LIMIT_MB,
            pids_limit: DEFAULT_PIDS_LIMIT,
            timeout_seconds: DEFAULT_EXECUTION_TIMEOUT_SECONDS,
        }
    }
}

impl GradingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            visible_case_count: parse_var("VISIBLE_CASE_COUNT", DEFAULT_VISIBLE_CASE_COUNT)?,
            retry_backoff_ms: parse_var("RUNNER_RETRY_BACKOFF_MS", DEFAULT_RETRY_BACKOFF_MS)?,
            token_ttl_seconds: parse_var("GRADE_TOKEN_TTL_SECONDS", DEFAULT_GRADE_TOKEN_TTL_SECONDS)?,
        })
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            visible_case_count: DEFAULT_VISIBLE_CASE_COUNT,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            token_ttl_seconds: DEFAULT_GRADE_TOKEN_TTL_SECONDS,
        }
    }
}

/// Read an optional variable, falling back to `default` when unset
fn parse_var<T: FromStr + ToString>(name: &str, default: T) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let grading = GradingConfig::default();
        assert_eq!(grading.visible_case_count, 3);
        assert_eq!(grading.retry_backoff(), Duration::from_millis(500));

        let sandbox = SandboxConfig::default();
        assert_eq!(sandbox.timeout(), Duration::from_secs(10));
        assert_eq!(sandbox.python_image, "python:3.12-slim");
    }

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("PRETTY".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
