//! Grading engine
//!
//! Runs a submitted solution against a problem's test cases in one sandbox
//! call, scores the results and, for full submissions, records the outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    config::Config,
    constants::{MAX_STDERR_EXCERPT, RUNNER_FAILURE_EXIT_CODES, SANDBOX_OVERHEAD_SECONDS},
    error::{AppError, AppResult, GradingError, SchedulingError},
    harness::{decode_results, encode_cases, CaseOutput, HarnessGenerator},
    models::{
        FailedCase, GradeToken, Language, ProblemDetail, ReviewState, Submission, SubmissionStatus,
        TestCase,
    },
    sandbox::{ExecutionAdapter, ExecutionRequest},
    scheduling::ReviewService,
    store::{ProblemStore, SubmissionStore, TokenStore},
    utils::Clock,
};

use super::compare::json_eq;

/// Tunables for grading runs
#[derive(Debug, Clone)]
pub struct GradingSettings {
    /// Length of the test-case prefix used by quick runs
    pub visible_case_count: usize,
    /// Wall-clock ceiling enforced inside the sandbox
    pub execution_timeout: Duration,
    pub retry_backoff: Duration,
    pub token_ttl: Duration,
}

impl GradingSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            visible_case_count: config.grading.visible_case_count,
            execution_timeout: config.sandbox.timeout(),
            retry_backoff: config.grading.retry_backoff(),
            token_ttl: config.grading.token_ttl(),
        }
    }

    /// Hard limit on one adapter call, including container overhead
    fn call_ceiling(&self) -> Duration {
        self.execution_timeout + Duration::from_secs(SANDBOX_OVERHEAD_SECONDS)
    }
}

/// Result of one case in a quick run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseReport {
    pub index: usize,
    pub input: Value,
    pub expected: Value,
    pub actual: Option<Value>,
    pub error: Option<String>,
    pub passed: bool,
}

impl CaseReport {
    fn to_failed_case(&self) -> FailedCase {
        FailedCase {
            index: self.index as i32,
            input: self.input.clone(),
            expected: self.expected.clone(),
            actual: self.actual.clone(),
            error: self.error.clone(),
        }
    }
}

/// Pass/fail counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl GradeSummary {
    fn of(reports: &[CaseReport], total: usize) -> Self {
        let passed = reports.iter().filter(|r| r.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
        }
    }
}

/// Quick-run feedback; nothing is persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub results: Vec<CaseReport>,
    pub summary: GradeSummary,
    pub runtime_ms: i64,
    /// Error output of a program that crashed before reporting results
    pub error_detail: Option<String>,
}

/// Outcome of a full submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitReport {
    pub submission: Submission,
    /// Present only when every case passed
    pub grade_token: Option<GradeToken>,
}

/// What a completed sandbox call told us about the user's program
enum RunOutcome {
    Completed { outputs: Vec<CaseOutput>, runtime_ms: i64 },
    Crashed { stderr: String, runtime_ms: i64 },
}

#[derive(Clone)]
pub struct GradingEngine {
    adapter: Arc<dyn ExecutionAdapter>,
    problems: Arc<dyn ProblemStore>,
    submissions: Arc<dyn SubmissionStore>,
    tokens: Arc<dyn TokenStore>,
    reviews: Arc<ReviewService>,
    clock: Arc<dyn Clock>,
    settings: GradingSettings,
}

impl GradingEngine {
    pub fn new(
        adapter: Arc<dyn ExecutionAdapter>,
        problems: Arc<dyn ProblemStore>,
        submissions: Arc<dyn SubmissionStore>,
        tokens: Arc<dyn TokenStore>,
        reviews: Arc<ReviewService>,
        clock: Arc<dyn Clock>,
        settings: GradingSettings,
    ) -> Self {
        Self {
            adapter,
            problems,
            submissions,
            tokens,
            reviews,
            clock,
            settings,
        }
    }

    /// Run the visible cases only. Nothing is stored and no token is issued.
    pub async fn run_quick(&self, code: &str, language: Language, problem_slug: &str) -> AppResult<RunReport> {
        let problem = self.load_problem(problem_slug).await?;
        let cases = problem.visible_cases(self.settings.visible_case_count);
        if cases.is_empty() {
            return Err(AppError::Validation("Problem has no test cases".to_string()));
        }

        let request = Self::prepare(&problem, language, code, cases)?;
        let outcome = self.execute_with_retry(request, cases.len()).await?;

        Ok(match outcome {
            RunOutcome::Completed { outputs, runtime_ms } => {
                let results = evaluate(cases, &outputs);
                RunReport {
                    summary: GradeSummary::of(&results, cases.len()),
                    results,
                    runtime_ms,
                    error_detail: None,
                }
            }
            RunOutcome::Crashed { stderr, runtime_ms } => RunReport {
                results: Vec::new(),
                summary: GradeSummary {
                    total: cases.len(),
                    passed: 0,
                    failed: cases.len(),
                },
                runtime_ms,
                error_detail: Some(stderr_excerpt(&stderr)),
            },
        })
    }

    /// Run every case, record exactly one submission and, on a full pass,
    /// record the solve and issue a grade token.
    ///
    /// The work runs on its own task: a caller that goes away does not stop
    /// it, so the submission, the solve and the token are written together.
    pub async fn submit(
        &self,
        code: &str,
        language: Language,
        problem_slug: &str,
        user_id: Uuid,
    ) -> AppResult<SubmitReport> {
        let engine = self.clone();
        let code = code.to_string();
        let problem_slug = problem_slug.to_string();

        tokio::spawn(async move { engine.grade_submission(&code, language, &problem_slug, user_id).await })
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("submission task failed: {e}")))?
    }

    async fn grade_submission(
        &self,
        code: &str,
        language: Language,
        problem_slug: &str,
        user_id: Uuid,
    ) -> AppResult<SubmitReport> {
        let problem = self.load_problem(problem_slug).await?;
        let cases = problem.test_cases.as_slice();
        if cases.is_empty() {
            return Err(AppError::Validation("Problem has no test cases".to_string()));
        }

        let request = Self::prepare(&problem, language, code, cases)?;
        let outcome = self.execute_with_retry(request, cases.len()).await;

        let mut submission = Submission {
            id: Uuid::new_v4(),
            user_id,
            problem_id: problem.summary.id,
            code: code.to_string(),
            language,
            status: SubmissionStatus::Failed,
            total_cases: cases.len() as i32,
            passed_count: 0,
            first_failure: None,
            runtime_ms: None,
            error_detail: None,
            submitted_at: self.clock.now(),
        };

        match outcome {
            Ok(RunOutcome::Completed { outputs, runtime_ms }) => {
                let results = evaluate(cases, &outputs);
                let summary = GradeSummary::of(&results, cases.len());
                submission.passed_count = summary.passed as i32;
                submission.first_failure = results.iter().find(|r| !r.passed).map(CaseReport::to_failed_case);
                submission.runtime_ms = Some(runtime_ms);
                if summary.failed == 0 {
                    submission.status = SubmissionStatus::Passed;
                }
            }
            Ok(RunOutcome::Crashed { stderr, runtime_ms }) => {
                submission.runtime_ms = Some(runtime_ms);
                submission.error_detail = Some(stderr_excerpt(&stderr));
            }
            Err(err) => {
                submission.status = match err {
                    GradingError::Timeout(_) => SubmissionStatus::Timeout,
                    GradingError::RunnerUnavailable(_) => SubmissionStatus::RunnerUnavailable,
                };
                submission.error_detail = Some(err.to_string());
            }
        }

        self.submissions.record(&submission).await?;

        tracing::info!(
            submission_id = %submission.id,
            user_id = %user_id,
            problem = %problem_slug,
            status = %submission.status,
            passed = submission.passed_count,
            total = submission.total_cases,
            "Submission recorded"
        );

        let grade_token = if submission.passed() {
            let state = self.record_solve(user_id, problem.summary.id).await?;
            Some(self.issue_token(&submission, &state).await?)
        } else {
            None
        };

        Ok(SubmitReport {
            submission,
            grade_token,
        })
    }

    /// Past submissions for a problem, newest first
    pub async fn history(&self, user_id: Uuid, problem_slug: &str) -> AppResult<Vec<Submission>> {
        let problem = self.load_problem(problem_slug).await?;
        self.submissions
            .list_for_problem(user_id, problem.summary.id)
            .await
    }

    async fn load_problem(&self, slug: &str) -> AppResult<ProblemDetail> {
        self.problems
            .get_problem(slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Problem '{}' not found", slug)))
    }

    fn prepare(
        problem: &ProblemDetail,
        language: Language,
        code: &str,
        cases: &[TestCase],
    ) -> AppResult<ExecutionRequest> {
        let entry = problem.language(language).ok_or_else(|| {
            AppError::Validation(format!(
                "Problem '{}' is not available in {}",
                problem.summary.slug, language
            ))
        })?;

        let signature = &entry.function_signature;
        if cases.iter().any(|c| c.input.len() != signature.arity()) {
            tracing::warn!(
                problem = %problem.summary.slug,
                function = %signature.name,
                arity = signature.arity(),
                "Test case argument count differs from the declared signature"
            );
        }

        let source = HarnessGenerator::generate(language, code, signature)?;

        Ok(ExecutionRequest {
            source,
            language,
            stdin: encode_cases(cases),
        })
    }

    /// Solves only bump counters, so losing a race to another passing
    /// submission is resolved by re-reading once.
    async fn record_solve(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<ReviewState> {
        match self.reviews.record_solve(user_id, problem_id).await {
            Err(AppError::Scheduling(SchedulingError::ConcurrentUpdate)) => {
                tracing::debug!(
                    user_id = %user_id,
                    problem_id = %problem_id,
                    "Solve raced another write, retrying"
                );
                self.reviews.record_solve(user_id, problem_id).await
            }
            other => other,
        }
    }

    async fn issue_token(&self, submission: &Submission, state: &ReviewState) -> AppResult<GradeToken> {
        let token = GradeToken::new(
            submission.user_id,
            submission.problem_id,
            submission.id,
            state.version,
            self.clock.now(),
        );
        self.tokens.issue(&token, self.settings.token_ttl).await?;

        tracing::debug!(token_id = %token.id, submission_id = %submission.id, "Grade token issued");

        Ok(token)
    }

    /// One adapter call, repeated once after a backoff if the runner failed
    async fn execute_with_retry(
        &self,
        request: ExecutionRequest,
        expected_len: usize,
    ) -> Result<RunOutcome, GradingError> {
        match self.execute_once(request.clone(), expected_len).await {
            Err(GradingError::RunnerUnavailable(reason)) => {
                tracing::warn!(
                    language = %request.language,
                    reason = %reason,
                    backoff_ms = self.settings.retry_backoff.as_millis() as u64,
                    "Runner unavailable, retrying once"
                );
                tokio::time::sleep(self.settings.retry_backoff).await;
                self.execute_once(request, expected_len).await
            }
            other => other,
        }
    }

    async fn execute_once(
        &self,
        request: ExecutionRequest,
        expected_len: usize,
    ) -> Result<RunOutcome, GradingError> {
        let timeout_secs = self.settings.execution_timeout.as_secs();
        let language = request.language;
        let started = Instant::now();

        // Spawned so that an abandoned request does not cancel the sandbox;
        // the detached result is simply dropped.
        let adapter = Arc::clone(&self.adapter);
        let handle = tokio::spawn(async move { adapter.execute(request).await });

        let output = match tokio::time::timeout(self.settings.call_ceiling(), handle).await {
            Err(_) => {
                tracing::warn!(language = %language, "Sandbox call exceeded its ceiling");
                return Err(GradingError::Timeout(timeout_secs));
            }
            Ok(Err(join_err)) => return Err(GradingError::RunnerUnavailable(join_err.to_string())),
            Ok(Ok(Err(sandbox_err))) => {
                return Err(GradingError::RunnerUnavailable(sandbox_err.to_string()));
            }
            Ok(Ok(Ok(output))) => output,
        };

        tracing::debug!(
            language = %language,
            exit_code = output.exit_code,
            timed_out = output.timed_out,
            wall_time_ms = output.wall_time_ms,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Sandbox call finished"
        );

        if output.timed_out {
            return Err(GradingError::Timeout(timeout_secs));
        }
        if RUNNER_FAILURE_EXIT_CODES.contains(&output.exit_code) {
            return Err(GradingError::RunnerUnavailable(format!(
                "runner exited with status {}",
                output.exit_code
            )));
        }

        match decode_results(&output.stdout, expected_len) {
            Ok(outputs) => Ok(RunOutcome::Completed {
                outputs,
                runtime_ms: output.wall_time_ms,
            }),
            // The user's program died before the harness could report
            Err(_) if output.exit_code != 0 => Ok(RunOutcome::Crashed {
                stderr: output.stderr,
                runtime_ms: output.wall_time_ms,
            }),
            Err(err) => Err(GradingError::RunnerUnavailable(err.to_string())),
        }
    }
}

/// Score each case in order
fn evaluate(cases: &[TestCase], outputs: &[CaseOutput]) -> Vec<CaseReport> {
    cases
        .iter()
        .zip(outputs)
        .enumerate()
        .map(|(index, (case, output))| CaseReport {
            index,
            input: case.input_value(),
            expected: case.expected.clone(),
            actual: output.value().cloned(),
            error: output.error_message(),
            passed: output.value().is_some_and(|v| json_eq(v, &case.expected)),
        })
        .collect()
}

/// Tail of stderr, where tracebacks end
fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    let len = trimmed.chars().count();
    trimmed.chars().skip(len.saturating_sub(MAX_STDERR_EXCERPT)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::HarnessError,
        models::{FunctionSignature, Parameter, ProblemLanguage, ProblemSummary},
        sandbox::{ExecutionOutput, MockExecutionAdapter, SandboxError},
        store::{MemoryStore, MemoryTokenStore, ProgressStore},
        utils::FixedClock,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;

    const SOLUTION: &str = "class Solution:\n    def twoSum(self, nums, target):\n        seen = {}\n        for i, n in enumerate(nums):\n            if target - n in seen:\n                return [seen[target - n], i]\n            seen[n] = i\n";

    fn two_sum() -> ProblemDetail {
        let cases = [
            (json!([[2, 7, 11, 15], 9]), json!([0, 1])),
            (json!([[3, 2, 4], 6]), json!([1, 2])),
            (json!([[3, 3], 6]), json!([0, 1])),
            (json!([[1, 5, 8], 13]), json!([1, 2])),
        ];

        ProblemDetail {
            summary: ProblemSummary {
                id: Uuid::new_v4(),
                slug: "two-sum".to_string(),
                title: "Two Sum".to_string(),
                difficulty: "easy".to_string(),
                pattern: vec!["hash-map".to_string()],
                sequence_number: 1,
            },
            languages: vec![ProblemLanguage {
                language: Language::Python,
                starter_code: "class Solution:\n    def twoSum(self, nums, target):\n        pass\n".to_string(),
                function_signature: FunctionSignature {
                    name: "twoSum".to_string(),
                    params: vec![
                        Parameter { name: "nums".to_string(), type_name: "List[int]".to_string() },
                        Parameter { name: "target".to_string(), type_name: "int".to_string() },
                    ],
                    return_type: Some("List[int]".to_string()),
                },
            }],
            test_cases: cases
                .into_iter()
                .enumerate()
                .map(|(i, (input, expected))| TestCase {
                    id: Uuid::new_v4(),
                    input: input.as_array().cloned().unwrap_or_default(),
                    expected,
                    sequence: i as i32 + 1,
                })
                .collect(),
        }
    }

    fn stdout(results: Value) -> ExecutionOutput {
        ExecutionOutput {
            stdout: format!("{}\n", results),
            wall_time_ms: 42,
            ..Default::default()
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        tokens: Arc<MemoryTokenStore>,
        engine: GradingEngine,
        problem: ProblemDetail,
    }

    async fn harness(adapter: impl ExecutionAdapter + 'static) -> Harness {
        harness_with_progress(adapter, |store| store as Arc<dyn ProgressStore>).await
    }

    /// Like [`harness`], with scheduling writes routed through a wrapper
    async fn harness_with_progress(
        adapter: impl ExecutionAdapter + 'static,
        progress: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn ProgressStore>,
    ) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(MemoryTokenStore::new());
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()));
        let problem = two_sum();
        store.add_problem(problem.clone()).await;

        let reviews = Arc::new(ReviewService::new(progress(store.clone()), tokens.clone(), clock.clone()));
        let settings = GradingSettings {
            visible_case_count: 3,
            execution_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(500),
            token_ttl: Duration::from_secs(900),
        };
        let engine = GradingEngine::new(
            Arc::new(adapter),
            store.clone(),
            store.clone(),
            tokens.clone(),
            reviews,
            clock,
            settings,
        );

        Harness {
            store,
            tokens,
            engine,
            problem,
        }
    }

    #[tokio::test]
    async fn test_quick_run_uses_visible_prefix() {
        let mut adapter = MockExecutionAdapter::new();
        adapter
            .expect_execute()
            .times(1)
            .withf(|req| req.stdin == "[[[2,7,11,15],9],[[3,2,4],6],[[3,3],6]]" && req.source.contains("twoSum"))
            .returning(|_| Ok(stdout(json!([[0, 1], [2, 1], {"__error__": "KeyError: 3"}]))));

        let h = harness(adapter).await;
        let report = h.engine.run_quick(SOLUTION, Language::Python, "two-sum").await.unwrap();

        assert_eq!(report.summary, GradeSummary { total: 3, passed: 1, failed: 2 });
        assert_eq!(report.results.len(), 3);
        assert!(report.results[0].passed);
        assert_eq!(report.results[1].actual, Some(json!([2, 1])));
        assert_eq!(report.results[2].error.as_deref(), Some("KeyError: 3"));
        assert!(h.store.submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_passing_submit_records_solve_and_issues_token() {
        let mut adapter = MockExecutionAdapter::new();
        adapter
            .expect_execute()
            .times(1)
            .returning(|_| Ok(stdout(json!([[0, 1], [1.0, 2.0], [0, 1], [1, 2]]))));

        let h = harness(adapter).await;
        let user = Uuid::new_v4();
        let report = h.engine.submit(SOLUTION, Language::Python, "two-sum", user).await.unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::Passed);
        assert_eq!(report.submission.passed_count, 4);
        assert!(report.submission.first_failure.is_none());

        let token = report.grade_token.unwrap();
        assert_eq!(token.submission_id, report.submission.id);
        assert!(h.tokens.peek(token.id).await.unwrap().is_some());

        let state = h.store.get_review_state(user, h.problem.summary.id).await.unwrap().unwrap();
        assert_eq!(state.times_solved, 1);
        assert_eq!(h.store.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_answer_itemizes_first_failure_only() {
        let mut adapter = MockExecutionAdapter::new();
        adapter
            .expect_execute()
            .times(1)
            .returning(|_| Ok(stdout(json!([[0, 1], [2, 1], [0, 1], null]))));

        let h = harness(adapter).await;
        let user = Uuid::new_v4();
        let report = h.engine.submit(SOLUTION, Language::Python, "two-sum", user).await.unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::Failed);
        assert_eq!(report.submission.passed_count, 2);
        assert!(report.grade_token.is_none());

        let failure = report.submission.first_failure.unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.input, json!([[3, 2, 4], 6]));
        assert_eq!(failure.expected, json!([1, 2]));
        assert_eq!(failure.actual, Some(json!([2, 1])));

        assert!(h.store.get_review_state(user, h.problem.summary.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_without_touching_schedule() {
        let mut adapter = MockExecutionAdapter::new();
        adapter.expect_execute().times(1).returning(|_| {
            Ok(ExecutionOutput {
                exit_code: 124,
                timed_out: true,
                wall_time_ms: 10_000,
                ..Default::default()
            })
        });

        let h = harness(adapter).await;
        let user = Uuid::new_v4();
        let report = h.engine.submit(SOLUTION, Language::Python, "two-sum", user).await.unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::Timeout);
        assert!(report.submission.status.is_infrastructure_failure());
        assert!(report.grade_token.is_none());
        assert_eq!(h.store.submissions().await.len(), 1);
        assert!(h.store.get_review_state(user, h.problem.summary.id).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_failure_is_retried_once() {
        let mut adapter = MockExecutionAdapter::new();
        let mut seq = mockall::Sequence::new();
        adapter
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(SandboxError::Docker("daemon restarting".to_string())));
        adapter
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(stdout(json!([[0, 1], [1, 2], [0, 1]]))));

        let h = harness(adapter).await;
        let report = h.engine.run_quick(SOLUTION, Language::Python, "two-sum").await.unwrap();
        assert_eq!(report.summary.passed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_unavailable_after_retry() {
        let mut adapter = MockExecutionAdapter::new();
        adapter
            .expect_execute()
            .times(4)
            .returning(|_| Ok(stdout(json!([[0, 1]]))));

        let h = harness(adapter).await;
        let user = Uuid::new_v4();
        let report = h.engine.submit(SOLUTION, Language::Python, "two-sum", user).await.unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::RunnerUnavailable);
        assert!(report.grade_token.is_none());

        let err = h.engine.run_quick(SOLUTION, Language::Python, "two-sum").await;
        assert!(matches!(err, Err(AppError::Grading(GradingError::RunnerUnavailable(_)))));
    }

    #[tokio::test]
    async fn test_crashed_program_is_a_correctness_failure() {
        let mut adapter = MockExecutionAdapter::new();
        adapter.expect_execute().times(1).returning(|_| {
            Ok(ExecutionOutput {
                stderr: "  File \"/workspace/main.py\", line 3\nSyntaxError: invalid syntax\n".to_string(),
                exit_code: 1,
                wall_time_ms: 30,
                ..Default::default()
            })
        });

        let h = harness(adapter).await;
        let report = h
            .engine
            .submit(SOLUTION, Language::Python, "two-sum", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::Failed);
        assert!(report.submission.error_detail.unwrap().contains("SyntaxError"));
    }

    #[tokio::test]
    async fn test_missing_entry_point_fails_before_execution() {
        let mut adapter = MockExecutionAdapter::new();
        adapter.expect_execute().times(0);

        let h = harness(adapter).await;
        let err = h
            .engine
            .submit("def two_sum(nums, target):\n    return []\n", Language::Python, "two-sum", Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Harness(HarnessError::MissingEntryPoint(_))));
        assert!(h.store.submissions().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_problem_and_language() {
        let h = harness(MockExecutionAdapter::new()).await;

        let missing = h.engine.run_quick(SOLUTION, Language::Python, "three-sum").await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));

        let js = h.engine.run_quick("function twoSum() {}", Language::JavaScript, "two-sum").await;
        assert!(matches!(js, Err(AppError::Validation(_))));
    }

    /// Never answers within the ceiling
    struct StuckAdapter;

    #[async_trait]
    impl ExecutionAdapter for StuckAdapter {
        async fn execute(&self, _request: ExecutionRequest) -> Result<ExecutionOutput, SandboxError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ExecutionOutput::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_adapter_hits_ceiling() {
        let h = harness(StuckAdapter).await;
        let report = h
            .engine
            .submit(SOLUTION, Language::Python, "two-sum", Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(report.submission.status, SubmissionStatus::Timeout);
        assert!(report.grade_token.is_none());
    }

    /// Delegates to the memory store, with hooks to slow down reads or lose
    /// the first write to a competing solve
    struct WrappedProgress {
        inner: Arc<MemoryStore>,
        read_delay: Duration,
        lose_first_write: std::sync::atomic::AtomicBool,
    }

    impl WrappedProgress {
        fn new(inner: Arc<MemoryStore>) -> Self {
            Self {
                inner,
                read_delay: Duration::ZERO,
                lose_first_write: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl ProgressStore for WrappedProgress {
        async fn get_review_state(&self, user_id: Uuid, problem_id: Uuid) -> AppResult<Option<ReviewState>> {
            tokio::time::sleep(self.read_delay).await;
            self.inner.get_review_state(user_id, problem_id).await
        }

        async fn upsert_review_state(&self, state: &ReviewState, expected_version: i64) -> AppResult<ReviewState> {
            if self.lose_first_write.swap(false, std::sync::atomic::Ordering::SeqCst) {
                // Another passing submission lands the same write first
                self.inner.upsert_review_state(state, expected_version).await?;
                return Err(SchedulingError::ConcurrentUpdate.into());
            }
            self.inner.upsert_review_state(state, expected_version).await
        }

        async fn list_due(&self, user_id: Uuid, today: NaiveDate) -> AppResult<Vec<crate::models::TrackedProblem>> {
            self.inner.list_due(user_id, today).await
        }

        async fn list_unattempted(&self, user_id: Uuid) -> AppResult<Vec<ProblemSummary>> {
            self.inner.list_unattempted(user_id).await
        }

        async fn list_mastered(&self, user_id: Uuid) -> AppResult<Vec<crate::models::TrackedProblem>> {
            self.inner.list_mastered(user_id).await
        }

        async fn stats(&self, user_id: Uuid, today: NaiveDate) -> AppResult<crate::models::ProgressStats> {
            self.inner.stats(user_id, today).await
        }
    }

    fn passing_adapter() -> MockExecutionAdapter {
        let mut adapter = MockExecutionAdapter::new();
        adapter
            .expect_execute()
            .times(1)
            .returning(|_| Ok(stdout(json!([[0, 1], [1, 2], [0, 1], [1, 2]]))));
        adapter
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_submit_still_records_solve_and_token() {
        let h = harness_with_progress(passing_adapter(), |store| -> Arc<dyn ProgressStore> {
            Arc::new(WrappedProgress {
                read_delay: Duration::from_millis(200),
                ..WrappedProgress::new(store)
            })
        })
        .await;
        let user = Uuid::new_v4();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(100),
            h.engine.submit(SOLUTION, Language::Python, "two-sum", user),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(1)).await;

        let submissions = h.store.submissions().await;
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].status, SubmissionStatus::Passed);

        let state = h.store.get_review_state(user, h.problem.summary.id).await.unwrap().unwrap();
        assert_eq!(state.times_solved, 1);
        assert_eq!(h.tokens.live_tokens(user).await.len(), 1);
    }

    #[tokio::test]
    async fn test_passing_submit_survives_racing_solve() {
        let h = harness_with_progress(passing_adapter(), |store| -> Arc<dyn ProgressStore> {
            Arc::new(WrappedProgress {
                lose_first_write: std::sync::atomic::AtomicBool::new(true),
                ..WrappedProgress::new(store)
            })
        })
        .await;
        let user = Uuid::new_v4();

        let report = h.engine.submit(SOLUTION, Language::Python, "two-sum", user).await.unwrap();

        let state = h.store.get_review_state(user, h.problem.summary.id).await.unwrap().unwrap();
        assert_eq!(state.times_solved, 2);
        assert_eq!(report.grade_token.unwrap().state_version, state.version);
    }

    #[test]
    fn test_stderr_excerpt_keeps_tail() {
        let long = format!("{}Boom", "x".repeat(MAX_STDERR_EXCERPT * 2));
        let excerpt = stderr_excerpt(&long);
        assert_eq!(excerpt.chars().count(), MAX_STDERR_EXCERPT);
        assert!(excerpt.ends_with("Boom"));
    }
}
