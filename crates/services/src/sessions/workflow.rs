use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::{ApiError, AttemptGateway, Backend, TestGateway};
use exam_core::Clock;
use exam_core::model::{AnswerValue, AttemptId, Question, QuestionId, TestId};

use super::progress::SessionProgress;
use super::service::{SessionStatus, TestSession, Tick};
use crate::error::SessionError;

/// Lifecycle of a controller, as visible to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Active,
    Submitting,
    Submitted,
    /// The initial load failed. Terminal for this controller.
    Failed,
}

/// Outcome of a submit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This call finalized the attempt.
    Submitted,
    /// Another submit is in flight; nothing was sent.
    AlreadyPending,
    /// The attempt was finalized earlier.
    AlreadySubmitted,
}

enum ControllerState {
    Idle,
    Loading,
    Running(TestSession),
    Failed,
}

fn running(state: &ControllerState) -> Result<&TestSession, SessionError> {
    match state {
        ControllerState::Running(session) => Ok(session),
        _ => Err(SessionError::NotStarted),
    }
}

fn running_mut(state: &mut ControllerState) -> Result<&mut TestSession, SessionError> {
    match state {
        ControllerState::Running(session) => Ok(session),
        _ => Err(SessionError::NotStarted),
    }
}

/// Drives one timed attempt at a test against the backend.
///
/// All methods take `&self`; state sits behind an internal mutex that is
/// never held across an await, so the controller can be shared between a
/// caller and the countdown task.
pub struct SessionController {
    tests: Arc<dyn TestGateway>,
    attempts: Arc<dyn AttemptGateway>,
    clock: Clock,
    state: Mutex<ControllerState>,
}

impl SessionController {
    #[must_use]
    pub fn new(tests: Arc<dyn TestGateway>, attempts: Arc<dyn AttemptGateway>) -> Self {
        Self::with_clock(tests, attempts, Clock::default_clock())
    }

    #[must_use]
    pub fn with_clock(
        tests: Arc<dyn TestGateway>,
        attempts: Arc<dyn AttemptGateway>,
        clock: Clock,
    ) -> Self {
        Self {
            tests,
            attempts,
            clock,
            state: Mutex::new(ControllerState::Idle),
        }
    }

    #[must_use]
    pub fn from_backend(backend: &Backend) -> Self {
        Self::new(Arc::clone(&backend.tests), Arc::clone(&backend.attempts))
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the test and open a server-tracked attempt.
    ///
    /// One controller drives exactly one attempt: any later call, including
    /// while the first is still loading or after a failed load, returns
    /// `AlreadyInitialized`. A fresh attempt takes a fresh controller.
    ///
    /// # Errors
    ///
    /// Propagates the `ApiError` from the fetch or start call; either
    /// failure leaves the controller in the terminal `Failed` phase.
    pub async fn initialize(&self, test_id: TestId) -> Result<(), SessionError> {
        {
            let mut state = self.state();
            if !matches!(*state, ControllerState::Idle) {
                return Err(SessionError::AlreadyInitialized);
            }
            *state = ControllerState::Loading;
        }

        match self.load(test_id).await {
            Ok(session) => {
                *self.state() = ControllerState::Running(session);
                Ok(())
            }
            Err(err) => {
                tracing::error!(%test_id, error = %err, "failed to start attempt");
                *self.state() = ControllerState::Failed;
                Err(err.into())
            }
        }
    }

    async fn load(&self, test_id: TestId) -> Result<TestSession, ApiError> {
        let test = self.tests.fetch_test(test_id).await?;
        let attempt_id = self.attempts.start_attempt(test_id).await?;
        tracing::info!(%test_id, %attempt_id, "attempt started");
        Ok(TestSession::new(test, attempt_id, self.clock.now()))
    }

    /// Record an answer locally and persist it in the background.
    ///
    /// The local sheet is the source of truth for progress. The save runs
    /// detached: a failure is logged with the question id and otherwise
    /// ignored, and nothing waits for the acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`,
    /// `UnknownQuestion`/`Answer` for invalid input, and `AlreadySubmitted`
    /// once the attempt is final.
    pub fn record_answer(
        &self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        let attempt_id = {
            let mut state = self.state();
            let session = running_mut(&mut state)?;
            session.record_answer(question_id, value.clone())?;
            session.attempt_id()
        };

        let attempts = Arc::clone(&self.attempts);
        tokio::spawn(async move {
            if let Err(err) = attempts.save_answer(attempt_id, question_id, &value).await {
                tracing::warn!(%attempt_id, %question_id, error = %err, "answer save failed");
            }
        });
        Ok(())
    }

    /// Move the cursor. Out-of-range targets are ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        let mut state = self.state();
        running_mut(&mut state)?.go_to(index);
        Ok(())
    }

    /// Move the cursor one question forward, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn advance(&self) -> Result<(), SessionError> {
        let mut state = self.state();
        running_mut(&mut state)?.advance();
        Ok(())
    }

    /// Move the cursor one question back, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn back(&self) -> Result<(), SessionError> {
        let mut state = self.state();
        running_mut(&mut state)?.back();
        Ok(())
    }

    /// Advance the countdown by one second.
    ///
    /// When the timer hits zero the attempt is submitted from here. An
    /// auto-submit that fails is logged and the session stays active for a
    /// manual retry; the timer stays exhausted, so it will not fire again.
    /// Before `initialize` and after submission this is a no-op.
    pub async fn tick(&self) -> Tick {
        let outcome = {
            let mut state = self.state();
            match running_mut(&mut state) {
                Ok(session) => session.tick(),
                Err(_) => return Tick::Idle,
            }
        };

        if outcome == Tick::Expired {
            tracing::info!("time expired, submitting attempt");
            if let Err(err) = self.submit().await {
                tracing::warn!(error = %err, "auto-submit failed");
            }
        }
        outcome
    }

    /// Finalize the attempt on the backend.
    ///
    /// Single-flight: concurrent calls collapse onto one network request
    /// and the rest report `AlreadyPending`. On failure the session
    /// reverts to active so the caller can retry.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`, or the
    /// `ApiError` from the submit call.
    pub async fn submit(&self) -> Result<SubmitOutcome, SessionError> {
        let attempt_id = {
            let mut state = self.state();
            let session = running_mut(&mut state)?;
            if session.is_submitted() {
                return Ok(SubmitOutcome::AlreadySubmitted);
            }
            if !session.begin_submit() {
                return Ok(SubmitOutcome::AlreadyPending);
            }
            session.attempt_id()
        };

        match self.attempts.submit_attempt(attempt_id).await {
            Ok(()) => {
                let submitted_at = self.clock.now();
                let mut state = self.state();
                if let Ok(session) = running_mut(&mut state) {
                    session.complete_submit(submitted_at);
                }
                tracing::info!(%attempt_id, "attempt submitted");
                Ok(SubmitOutcome::Submitted)
            }
            Err(err) => {
                {
                    let mut state = self.state();
                    if let Ok(session) = running_mut(&mut state) {
                        session.abort_submit();
                    }
                }
                tracing::warn!(%attempt_id, error = %err, "submit failed");
                Err(err.into())
            }
        }
    }

    /// Where the controller is in its lifecycle.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        match &*self.state() {
            ControllerState::Idle => SessionPhase::Uninitialized,
            ControllerState::Loading => SessionPhase::Loading,
            ControllerState::Failed => SessionPhase::Failed,
            ControllerState::Running(session) => match session.status() {
                SessionStatus::Active => SessionPhase::Active,
                SessionStatus::Submitting => SessionPhase::Submitting,
                SessionStatus::Submitted => SessionPhase::Submitted,
            },
        }
    }

    /// True once nothing more can happen here: submitted or failed to load.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase(),
            SessionPhase::Submitted | SessionPhase::Failed
        )
    }

    /// Snapshot of attempt progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn progress(&self) -> Result<SessionProgress, SessionError> {
        Ok(running(&self.state())?.progress())
    }

    /// The question under the cursor, cloned out of the session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn current_question(&self) -> Result<Question, SessionError> {
        Ok(running(&self.state())?.current_question().clone())
    }

    /// The locally recorded answer for a question, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn answer(&self, question_id: QuestionId) -> Result<Option<AnswerValue>, SessionError> {
        Ok(running(&self.state())?.answers().get(question_id).cloned())
    }

    /// Server id of the attempt this controller drives.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn attempt_id(&self) -> Result<AttemptId, SessionError> {
        Ok(running(&self.state())?.attempt_id())
    }

    /// Title of the loaded test.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `initialize`.
    pub fn test_title(&self) -> Result<String, SessionError> {
        Ok(running(&self.state())?.test().title().to_owned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
