//! Execution request DTOs

use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::utils::validate_slug;

/// Body of both quick runs and full submissions
#[derive(Debug, Deserialize, Validate)]
pub struct ExecuteCodeRequest {
    #[validate(custom(function = "validate_problem_slug"))]
    pub problem_slug: String,

    /// Programming language
    #[validate(length(min = 1, max = 20))]
    pub language: String,

    /// Source code
    #[validate(length(min = 1, max = 65536))] // 64KB max
    pub code: String,
}

fn validate_problem_slug(slug: &str) -> Result<(), ValidationError> {
    validate_slug(slug).map_err(|message| ValidationError::new("slug").with_message(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(problem_slug: &str, code: &str) -> ExecuteCodeRequest {
        ExecuteCodeRequest {
            problem_slug: problem_slug.to_string(),
            language: "python".to_string(),
            code: code.to_string(),
        }
    }

    #[test]
    fn test_validation() {
        assert!(request("two-sum", "def twoSum(): pass").validate().is_ok());
        assert!(request("Two Sum", "def twoSum(): pass").validate().is_err());
        assert!(request("two-sum", "").validate().is_err());
    }
}
