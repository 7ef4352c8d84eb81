//! Supported submission languages

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{constants::languages, error::HarnessError};

/// Languages a submission can be graded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
}

impl Language {
    /// Get language as stored/API string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => languages::PYTHON,
            Self::JavaScript => languages::JAVASCRIPT,
        }
    }
}

impl FromStr for Language {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            languages::PYTHON | "python3" | "py" => Ok(Self::Python),
            languages::JAVASCRIPT | "js" | "node" => Ok(Self::JavaScript),
            other => Err(HarnessError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("js".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!(
            "cobol".parse::<Language>(),
            Err(HarnessError::UnsupportedLanguage("cobol".to_string()))
        );
    }
}
