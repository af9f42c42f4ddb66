use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use exam_core::model::{
    AnswerValue, AttemptId, AttemptReport, AttemptStatus, GradedAnswer, QuestionId, Test, TestBrief,
    TestId,
};

/// Errors surfaced by backend gateways.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    #[error("not found")]
    NotFound,

    #[error("attempt denied: {reason}")]
    AttemptDenied { reason: String },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    pub(crate) fn transport(err: impl core::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub(crate) fn denied(reason: impl Into<String>) -> Self {
        Self::AttemptDenied {
            reason: reason.into(),
        }
    }

    /// True for failures worth retrying (network or decode trouble).
    ///
    /// `NotFound` and `AttemptDenied` are verdicts from the backend and do
    /// not change on retry.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Read-only access to published tests.
#[async_trait]
pub trait TestGateway: Send + Sync {
    /// Fetch a test with its ordered question list.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` if the test does not exist, or
    /// `ApiError::Transport` on network/decode failures.
    async fn fetch_test(&self, id: TestId) -> Result<Test, ApiError>;
}

/// Lifecycle operations for one server-tracked attempt at a test.
#[async_trait]
pub trait AttemptGateway: Send + Sync {
    /// Open a new attempt, returning its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::AttemptDenied` when the backend refuses another
    /// attempt (for example an exhausted attempt limit).
    async fn start_attempt(&self, test_id: TestId) -> Result<AttemptId, ApiError>;

    /// Persist one answer. The backend keeps the latest value per question.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the attempt is unknown or the request fails.
    async fn save_answer(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        value: &AnswerValue,
    ) -> Result<(), ApiError>;

    /// Finalize the attempt. Grading happens server-side.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` on network failure; the attempt stays
    /// open and submission may be retried.
    async fn submit_attempt(&self, attempt_id: AttemptId) -> Result<(), ApiError>;

    /// Fetch the graded result summary for an attempt.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown attempts.
    async fn fetch_report(&self, attempt_id: AttemptId) -> Result<AttemptReport, ApiError>;
}

//
// ─── IN-MEMORY GATEWAY ─────────────────────────────────────────────────────────
//

struct OpenAttempt {
    test_id: TestId,
    number: u32,
    answers: HashMap<QuestionId, AnswerValue>,
    submitted: bool,
}

#[derive(Default)]
struct InMemoryState {
    tests: HashMap<TestId, Test>,
    answer_keys: HashMap<TestId, HashMap<QuestionId, AnswerValue>>,
    attempts: HashMap<AttemptId, OpenAttempt>,
    attempts_per_test: HashMap<TestId, u32>,
    next_attempt_id: u64,
}

/// Backend fake for tests and prototyping.
///
/// Mimics the hosted API closely enough to drive a whole attempt: it honors
/// `max_attempts`, keeps the latest answer per question, and grades
/// submissions against an optional hidden answer key (questions without a
/// key entry stay ungraded, like essays awaiting a teacher).
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    inner: Arc<Mutex<InMemoryState>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, InMemoryState>, ApiError> {
        self.inner.lock().map_err(ApiError::transport)
    }

    /// Register a test so it can be fetched and attempted.
    pub fn insert_test(&self, test: Test) {
        if let Ok(mut state) = self.inner.lock() {
            state.tests.insert(test.id(), test);
        }
    }

    /// Provide the hidden answer key used to grade submissions.
    pub fn set_answer_key(&self, test_id: TestId, key: HashMap<QuestionId, AnswerValue>) {
        if let Ok(mut state) = self.inner.lock() {
            state.answer_keys.insert(test_id, key);
        }
    }

    /// The answer currently persisted for a question, if any.
    #[must_use]
    pub fn saved_answer(&self, attempt_id: AttemptId, question_id: QuestionId) -> Option<AnswerValue> {
        self.inner.lock().ok().and_then(|state| {
            state
                .attempts
                .get(&attempt_id)
                .and_then(|a| a.answers.get(&question_id).cloned())
        })
    }

    #[must_use]
    pub fn is_submitted(&self, attempt_id: AttemptId) -> bool {
        self.inner
            .lock()
            .ok()
            .and_then(|state| state.attempts.get(&attempt_id).map(|a| a.submitted))
            .unwrap_or(false)
    }
}

#[async_trait]
impl TestGateway for InMemoryGateway {
    async fn fetch_test(&self, id: TestId) -> Result<Test, ApiError> {
        let state = self.lock()?;
        state.tests.get(&id).cloned().ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl AttemptGateway for InMemoryGateway {
    async fn start_attempt(&self, test_id: TestId) -> Result<AttemptId, ApiError> {
        let mut state = self.lock()?;
        let max_attempts = state
            .tests
            .get(&test_id)
            .ok_or(ApiError::NotFound)?
            .max_attempts();

        let number = state.attempts_per_test.get(&test_id).copied().unwrap_or(0) + 1;
        if let Some(max) = max_attempts {
            if number > max {
                return Err(ApiError::denied("maximum attempts reached"));
            }
        }
        state.attempts_per_test.insert(test_id, number);

        state.next_attempt_id += 1;
        let id = AttemptId::new(state.next_attempt_id);
        state.attempts.insert(
            id,
            OpenAttempt {
                test_id,
                number,
                answers: HashMap::new(),
                submitted: false,
            },
        );
        Ok(id)
    }

    async fn save_answer(
        &self,
        attempt_id: AttemptId,
        question_id: QuestionId,
        value: &AnswerValue,
    ) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        let attempt = state.attempts.get_mut(&attempt_id).ok_or(ApiError::NotFound)?;
        if attempt.submitted {
            return Err(ApiError::denied("attempt already submitted"));
        }
        attempt.answers.insert(question_id, value.clone());
        Ok(())
    }

    async fn submit_attempt(&self, attempt_id: AttemptId) -> Result<(), ApiError> {
        let mut state = self.lock()?;
        let attempt = state.attempts.get_mut(&attempt_id).ok_or(ApiError::NotFound)?;
        if attempt.submitted {
            return Err(ApiError::denied("attempt already submitted"));
        }
        attempt.submitted = true;
        Ok(())
    }

    async fn fetch_report(&self, attempt_id: AttemptId) -> Result<AttemptReport, ApiError> {
        let state = self.lock()?;
        let attempt = state.attempts.get(&attempt_id).ok_or(ApiError::NotFound)?;
        let test = state
            .tests
            .get(&attempt.test_id)
            .ok_or(ApiError::NotFound)?;
        let key = state.answer_keys.get(&attempt.test_id);

        let mut score = 0.0;
        let mut answers = Vec::with_capacity(attempt.answers.len());
        for question in test.questions() {
            let Some(value) = attempt.answers.get(&question.id()) else {
                continue;
            };
            let expected = key.and_then(|k| k.get(&question.id()));
            let is_correct = expected.map(|e| e == value);
            let points_earned = if is_correct == Some(true) {
                f64::from(question.points())
            } else {
                0.0
            };
            score += points_earned;
            answers.push(GradedAnswer {
                question_id: question.id(),
                value: Some(value.clone()),
                is_correct,
                points_earned,
                feedback: None,
            });
        }

        let percentage = if test.total_points() == 0 {
            0.0
        } else {
            score / f64::from(test.total_points()) * 100.0
        };
        let status = if !attempt.submitted {
            AttemptStatus::InProgress
        } else if answers.iter().any(|a| a.is_correct.is_none()) {
            AttemptStatus::Submitted
        } else {
            AttemptStatus::Graded
        };

        Ok(AttemptReport {
            id: attempt_id,
            test_id: attempt.test_id,
            status,
            score,
            percentage,
            passed: percentage >= f64::from(test.passing_score()),
            time_spent_seconds: 0,
            attempt_number: attempt.number,
            submitted_at: None,
            test: TestBrief {
                title: test.title().to_owned(),
                description: test.description().map(str::to_owned),
                total_points: test.total_points(),
                passing_score: test.passing_score(),
            },
            answers,
        })
    }
}

//
// ─── BACKEND AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the gateway traits behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Backend {
    pub tests: Arc<dyn TestGateway>,
    pub attempts: Arc<dyn AttemptGateway>,
}

impl Backend {
    #[must_use]
    pub fn in_memory() -> Self {
        let gateway = InMemoryGateway::new();
        let tests: Arc<dyn TestGateway> = Arc::new(gateway.clone());
        let attempts: Arc<dyn AttemptGateway> = Arc::new(gateway);
        Self { tests, attempts }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
