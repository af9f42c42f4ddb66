use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::model::{AnswerSheet, AnswerValue, AttemptId, Question, QuestionId, Test};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── STATUS & TICK ─────────────────────────────────────────────────────────────
//

/// Where a running session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Accepting answers and navigation.
    Active,
    /// A submit request is in flight.
    Submitting,
    /// The attempt is finalized. Terminal.
    Submitted,
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to count: untimed session, exhausted timer, or submission
    /// already underway.
    Idle,
    /// The timer moved down to `remaining` seconds.
    Counting { remaining: u32 },
    /// The timer just hit zero. Reported exactly once.
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one attempt at a test.
///
/// Pure bookkeeping: answers, cursor and countdown live here, while the
/// network side effects belong to `SessionController`. The cursor always
/// stays inside `[0, question_count)`; `Test` construction guarantees at
/// least one question.
pub struct TestSession {
    test: Test,
    attempt_id: AttemptId,
    answers: AnswerSheet,
    cursor: usize,
    remaining: Option<u32>,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl TestSession {
    /// Open a session for a fetched test and a server-issued attempt id.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic. The countdown starts at the full declared duration;
    /// untimed tests never count down.
    #[must_use]
    pub fn new(test: Test, attempt_id: AttemptId, started_at: DateTime<Utc>) -> Self {
        let remaining = test.duration_secs();
        Self {
            test,
            attempt_id,
            answers: AnswerSheet::new(),
            cursor: 0,
            remaining,
            status: SessionStatus::Active,
            started_at,
            submitted_at: None,
        }
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        &self.test
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    /// The question under the cursor.
    #[must_use]
    pub fn current_question(&self) -> &Question {
        // cursor is bounded by construction and clamped navigation
        &self.test.questions()[self.cursor]
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.test.question_count(),
            answered: self.answers.answered_count(),
            cursor: self.cursor,
            remaining_secs: self.remaining,
            status: self.status,
        }
    }

    /// Record an answer, replacing and returning any prior value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` once the attempt is final,
    /// `UnknownQuestion` for ids outside this test, and `Answer` when the
    /// value does not fit the question kind.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<Option<AnswerValue>, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        let question = self
            .test
            .question(question_id)
            .ok_or(SessionError::UnknownQuestion(question_id))?;
        question.validate_answer(&value)?;
        Ok(self.answers.record(question_id, value))
    }

    /// Move the cursor to `index`.
    ///
    /// Out-of-range targets and finalized sessions leave the cursor where
    /// it is; navigation never fails. Returns whether the cursor moved.
    pub fn go_to(&mut self, index: usize) -> bool {
        if self.is_submitted() || index >= self.test.question_count() {
            return false;
        }
        self.cursor = index;
        true
    }

    pub fn advance(&mut self) -> bool {
        self.go_to(self.cursor + 1)
    }

    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.go_to(self.cursor - 1)
    }

    /// Count one second off the timer.
    ///
    /// Only an active, timed session counts. The 1 -> 0 transition yields
    /// `Expired`; every later call yields `Idle`, so expiry handling runs
    /// at most once per session.
    pub fn tick(&mut self) -> Tick {
        if self.status != SessionStatus::Active {
            return Tick::Idle;
        }
        match self.remaining {
            None | Some(0) => Tick::Idle,
            Some(1) => {
                self.remaining = Some(0);
                Tick::Expired
            }
            Some(secs) => {
                let remaining = secs - 1;
                self.remaining = Some(remaining);
                Tick::Counting { remaining }
            }
        }
    }

    /// Claim the submit latch. False when a submit is already in flight or
    /// the attempt is final; exactly one caller wins.
    pub(crate) fn begin_submit(&mut self) -> bool {
        if self.status != SessionStatus::Active {
            return false;
        }
        self.status = SessionStatus::Submitting;
        true
    }

    /// Release the latch after a failed submit so it can be retried.
    pub(crate) fn abort_submit(&mut self) {
        if self.status == SessionStatus::Submitting {
            self.status = SessionStatus::Active;
        }
    }

    /// Finalize the attempt.
    pub(crate) fn complete_submit(&mut self, at: DateTime<Utc>) {
        self.status = SessionStatus::Submitted;
        self.submitted_at = Some(at);
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("test_id", &self.test.id())
            .field("attempt_id", &self.attempt_id)
            .field("answered", &self.answers.answered_count())
            .field("cursor", &self.cursor)
            .field("remaining", &self.remaining)
            .field("status", &self.status)
            .field("started_at", &self.started_at)
            .field("submitted_at", &self.submitted_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
