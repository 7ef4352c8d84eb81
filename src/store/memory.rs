//! In-process stores
//!
//! Same contracts as the Postgres and Redis implementations, including the
//! version check on review-state writes.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{
    error::{AppResult, SchedulingError},
    models::{GradeToken, ProblemDetail, ProblemSummary, ProgressStats, ReviewState, Submission, TrackedProblem},
};

use super::{ProblemStore, ProgressStore, SubmissionStore, TokenStore};

#[derive(Default)]
struct Tables {
    problems: Vec<ProblemDetail>,
    review_states: HashMap<(Uuid, Uuid), ReviewState>,
    submissions: Vec<Submission>,
}

impl Tables {
    fn summary(&self, problem_id: Uuid) -> Option<&ProblemSummary> {
        self.problems
            .iter()
            .map(|p| &p.summary)
            .find(|s| s.id == problem_id)
    }

    fn tracked(&self, user_id: Uuid, keep: impl Fn(&ReviewState) -> bool) -> Vec<TrackedProblem> {
        self.review_states
            .values()
            .filter(|s| s.user_id == user_id && keep(s))
            .filter_map(|state| {
                self.summary(state.problem_id).map(|problem| TrackedProblem {
                    problem: problem.clone(),
                    state: state.clone(),
                })
            })
            .collect()
    }
}

/// Problems, review states and submissions held in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem to the catalogue
    pub async fn add_problem(&self, problem: ProblemDetail) {
        self.tables.write().await.problems.push(problem);
    }

    /// Every recorded submission, oldest first
    pub async fn submissions(&self) -> Vec<Submission> {
        self.tables.read().await.submissions.clone()
    }
}

#[async_trait]
impl ProblemStore for MemoryStore {
    async fn get_problem(&self, slug: &str) -> AppResult<Option<ProblemDetail>> {
        let tables = self.tables.read().await;
        Ok(tables.problems.iter().find(|p| p.summary.slug == slug).cloned())
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_review_state(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Option<ReviewState>> {
        let tables = self.tables.read().await;
        Ok(tables.review_states.get(&(user_id, problem_id)).cloned())
    }

    async fn upsert_review_state(&self, state: &ReviewState, expected_version: i64) -> AppResult<ReviewState> {
        let mut tables = self.tables.write().await;
        let key = (state.user_id, state.problem_id);

        let current_version = tables.review_states.get(&key).map_or(0, |s| s.version);
        if current_version != expected_version {
            return Err(SchedulingError::ConcurrentUpdate.into());
        }

        let mut stored = state.clone();
        stored.version = expected_version + 1;
        tables.review_states.insert(key, stored.clone());

        Ok(stored)
    }

    async fn list_due(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<TrackedProblem>> {
        let tables = self.tables.read().await;
        Ok(tables.tracked(user_id, |s| s.is_due(today)))
    }

    async fn list_unattempted(&self, user_id: Uuid) -> AppResult<Vec<ProblemSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .problems
            .iter()
            .filter(|p| !tables.review_states.contains_key(&(user_id, p.summary.id)))
            .map(|p| p.summary.clone())
            .collect())
    }

    async fn list_mastered(&self, user_id: Uuid) -> AppResult<Vec<TrackedProblem>> {
        let tables = self.tables.read().await;
        Ok(tables.tracked(user_id, |s| s.is_mastered))
    }

    async fn stats(&self, user_id: Uuid, today: NaiveDate) -> AppResult<ProgressStats> {
        let tables = self.tables.read().await;
        let states: Vec<&ReviewState> = tables
            .review_states
            .values()
            .filter(|s| s.user_id == user_id)
            .collect();

        let total_problems = tables.problems.len() as i64;
        let solved_count = states.iter().filter(|s| s.times_solved > 0).count() as i64;
        let mastered_count = states.iter().filter(|s| s.is_mastered).count() as i64;

        let mut problems_by_difficulty = BTreeMap::new();
        let mut problems_by_pattern = BTreeMap::new();
        for problem in tables
            .problems
            .iter()
            .filter(|p| tables.review_states.contains_key(&(user_id, p.summary.id)))
        {
            *problems_by_difficulty
                .entry(problem.summary.difficulty.clone())
                .or_insert(0) += 1;
            for pattern in &problem.summary.pattern {
                *problems_by_pattern.entry(pattern.clone()).or_insert(0) += 1;
            }
        }

        Ok(ProgressStats {
            total_problems,
            solved_count,
            mastered_count,
            in_progress_count: states
                .iter()
                .filter(|s| s.times_solved > 0 && !s.is_mastered)
                .count() as i64,
            unsolved_count: total_problems - solved_count,
            due_for_review: states.iter().filter(|s| s.is_due(today)).count() as i64,
            problems_by_difficulty,
            problems_by_pattern,
        })
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn record(&self, submission: &Submission) -> AppResult<()> {
        self.tables.write().await.submissions.push(submission.clone());
        Ok(())
    }

    async fn list_for_problem(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Vec<Submission>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Submission> = tables
            .submissions
            .iter()
            .filter(|s| s.user_id == user_id && s.problem_id == problem_id)
            .cloned()
            .collect();
        found.reverse();
        Ok(found)
    }
}

/// Rating tokens with in-process expiry
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<HashMap<Uuid, (GradeToken, Instant)>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unexpired tokens held for a user
    pub async fn live_tokens(&self, user_id: Uuid) -> Vec<GradeToken> {
        let now = Instant::now();
        self.tokens
            .read()
            .await
            .values()
            .filter(|(token, expires_at)| token.user_id == user_id && now < *expires_at)
            .map(|(token, _)| token.clone())
            .collect()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn issue(&self, token: &GradeToken, ttl: Duration) -> AppResult<()> {
        let now = Instant::now();
        let mut tokens = self.tokens.write().await;
        tokens.retain(|_, (_, expires_at)| now < *expires_at);
        tokens.insert(token.id, (token.clone(), now + ttl));
        Ok(())
    }

    async fn peek(&self, id: Uuid) -> AppResult<Option<GradeToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .get(&id)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(token, _)| token.clone()))
    }

    async fn consume(&self, id: Uuid) -> AppResult<Option<GradeToken>> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .remove(&id)
            .filter(|(_, expires_at)| Instant::now() < *expires_at)
            .map(|(token, _)| token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn state(user_id: Uuid) -> ReviewState {
        ReviewState::new(user_id, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_upsert_enforces_expected_version() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let fresh = state(user);

        let created = store.upsert_review_state(&fresh, 0).await.unwrap();
        assert_eq!(created.version, 1);

        // A second create must not overwrite the row
        let err = store.upsert_review_state(&fresh, 0).await.unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Scheduling(SchedulingError::ConcurrentUpdate)
        ));

        let mut changed = created.clone();
        changed.review_count = 1;
        let updated = store.upsert_review_state(&changed, 1).await.unwrap();
        assert_eq!(updated.version, 2);

        // Stale writer still holding version 1
        assert!(store.upsert_review_state(&changed, 1).await.is_err());

        let stored = store
            .get_review_state(user, fresh.problem_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.review_count, 1);
        assert_eq!(stored.version, 2);
    }

    fn problem(sequence_number: i32, difficulty: &str, patterns: &[&str]) -> ProblemDetail {
        ProblemDetail {
            summary: ProblemSummary {
                id: Uuid::new_v4(),
                slug: format!("problem-{sequence_number}"),
                title: format!("Problem {sequence_number}"),
                difficulty: difficulty.to_string(),
                pattern: patterns.iter().map(|p| p.to_string()).collect(),
                sequence_number,
            },
            languages: Vec::new(),
            test_cases: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_stats_break_down_attempted_problems() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let two_sum = problem(1, "easy", &["array", "hash-map"]);
        let group_anagrams = problem(2, "medium", &["hash-map"]);
        let untouched = problem(3, "hard", &["graph"]);
        for p in [&two_sum, &group_anagrams, &untouched] {
            store.add_problem(p.clone()).await;
        }

        for p in [&two_sum, &group_anagrams] {
            let mut solved = ReviewState::new(user, p.summary.id);
            solved.times_solved = 1;
            store.upsert_review_state(&solved, 0).await.unwrap();
        }
        // Another user's progress is not counted
        store
            .upsert_review_state(&ReviewState::new(Uuid::new_v4(), untouched.summary.id), 0)
            .await
            .unwrap();

        let stats = store.stats(user, Utc::now().date_naive()).await.unwrap();
        assert_eq!(stats.total_problems, 3);
        assert_eq!(stats.solved_count, 2);
        assert_eq!(stats.unsolved_count, 1);
        assert_eq!(
            stats.problems_by_difficulty,
            BTreeMap::from([("easy".to_string(), 1), ("medium".to_string(), 1)])
        );
        assert_eq!(
            stats.problems_by_pattern,
            BTreeMap::from([("array".to_string(), 1), ("hash-map".to_string(), 2)])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokens_are_single_use_and_expire() {
        let store = MemoryTokenStore::new();
        let token = GradeToken::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1, Utc::now());
        store.issue(&token, Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.peek(token.id).await.unwrap(), Some(token.clone()));
        assert_eq!(store.consume(token.id).await.unwrap(), Some(token.clone()));
        assert_eq!(store.consume(token.id).await.unwrap(), None);

        let late = GradeToken::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1, Utc::now());
        store.issue(&late, Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.peek(late.id).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_issue_drops_expired_tokens() {
        let store = MemoryTokenStore::new();
        for _ in 0..3 {
            let stale = GradeToken::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1, Utc::now());
            store.issue(&stale, Duration::from_secs(60)).await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(61)).await;

        let fresh = GradeToken::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1, Utc::now());
        store.issue(&fresh, Duration::from_secs(60)).await.unwrap();

        let tokens = store.tokens.read().await;
        assert_eq!(tokens.len(), 1);
        assert!(tokens.contains_key(&fresh.id));
    }
}
