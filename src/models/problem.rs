//! Problem model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Language, TestCase};

/// Problem metadata as listed in sessions and progress views
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub difficulty: String,
    pub pattern: Vec<String>,
    /// Position in the curriculum; new problems are offered in this order
    pub sequence_number: i32,
}

/// One declared parameter of the entry-point function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Entry-point function the harness invokes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Parameter>,
    #[serde(default)]
    pub return_type: Option<String>,
}

impl FunctionSignature {
    /// Number of positional arguments each case must supply
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Language-specific starter material for a problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemLanguage {
    pub language: Language,
    pub starter_code: String,
    pub function_signature: FunctionSignature,
}

/// Everything the grading engine needs about one problem
#[derive(Debug, Clone)]
pub struct ProblemDetail {
    pub summary: ProblemSummary,
    pub languages: Vec<ProblemLanguage>,
    /// Ordered by `sequence`; immutable for the session
    pub test_cases: Vec<TestCase>,
}

impl ProblemDetail {
    /// Language entry for `language`, if the problem offers it
    pub fn language(&self, language: Language) -> Option<&ProblemLanguage> {
        self.languages.iter().find(|l| l.language == language)
    }

    /// Leading cases exposed to quick runs
    pub fn visible_cases(&self, count: usize) -> &[TestCase] {
        &self.test_cases[..count.min(self.test_cases.len())]
    }
}
