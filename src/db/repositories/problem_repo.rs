//! Problem repository

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{FunctionSignature, Language, ProblemDetail, ProblemLanguage, ProblemSummary, TestCase},
    store::ProblemStore,
};

#[derive(FromRow)]
struct LanguageRow {
    language: String,
    starter_code: String,
    function_signature: Json<FunctionSignature>,
}

#[derive(FromRow)]
struct TestCaseRow {
    id: Uuid,
    input: Json<Vec<Value>>,
    expected: Json<Value>,
    sequence: i32,
}

/// Repository for the problem catalogue
#[derive(Clone)]
pub struct ProblemRepository {
    pool: PgPool,
}

impl ProblemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find problem summary by slug
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<ProblemSummary>> {
        let problem = sqlx::query_as::<_, ProblemSummary>(
            r#"
            SELECT id, slug, title, difficulty, pattern, sequence_number
            FROM problems
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(problem)
    }

    /// Language variants of a problem
    async fn find_languages(&self, problem_id: Uuid) -> AppResult<Vec<ProblemLanguage>> {
        let rows = sqlx::query_as::<_, LanguageRow>(
            r#"
            SELECT language, starter_code, function_signature
            FROM problem_languages
            WHERE problem_id = $1
            ORDER BY language
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ProblemLanguage {
                    language: row.language.parse::<Language>()?,
                    starter_code: row.starter_code,
                    function_signature: row.function_signature.0,
                })
            })
            .collect()
    }

    /// Test cases of a problem, in execution order
    async fn find_test_cases(&self, problem_id: Uuid) -> AppResult<Vec<TestCase>> {
        let rows = sqlx::query_as::<_, TestCaseRow>(
            r#"
            SELECT id, input, expected, sequence
            FROM test_cases
            WHERE problem_id = $1
            ORDER BY sequence
            "#,
        )
        .bind(problem_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| TestCase {
                id: row.id,
                input: row.input.0,
                expected: row.expected.0,
                sequence: row.sequence,
            })
            .collect())
    }
}

#[async_trait]
impl ProblemStore for ProblemRepository {
    async fn get_problem(&self, slug: &str) -> AppResult<Option<ProblemDetail>> {
        let Some(summary) = self.find_by_slug(slug).await? else {
            return Ok(None);
        };

        let languages = self.find_languages(summary.id).await?;
        let test_cases = self.find_test_cases(summary.id).await?;

        Ok(Some(ProblemDetail {
            summary,
            languages,
            test_cases,
        }))
    }
}
