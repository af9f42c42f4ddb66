use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::answer::AnswerValue;
use crate::model::ids::{AttemptId, QuestionId, TestId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while interpreting a graded attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("unknown attempt status: {0}")]
    UnknownStatus(String),
}

//
// ─── ATTEMPT STATUS ────────────────────────────────────────────────────────────
//

/// Server-side lifecycle of an attempt.
///
/// Manually graded questions (essays) keep an attempt in `Submitted` until a
/// teacher finishes grading, at which point it becomes `Graded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    InProgress,
    Submitted,
    Graded,
}

impl AttemptStatus {
    /// Parses the backend's status discriminator.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::UnknownStatus` for unrecognized values.
    pub fn from_wire(value: &str) -> Result<Self, ReportError> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "graded" => Ok(Self::Graded),
            other => Err(ReportError::UnknownStatus(other.to_string())),
        }
    }

    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Submitted => "submitted",
            AttemptStatus::Graded => "graded",
        }
    }
}

//
// ─── GRADED ANSWER ─────────────────────────────────────────────────────────────
//

/// Grading outcome for one answered question.
///
/// `is_correct` is `None` while a manually graded answer is still waiting for
/// a teacher.
#[derive(Debug, Clone, PartialEq)]
pub struct GradedAnswer {
    pub question_id: QuestionId,
    pub value: Option<AnswerValue>,
    pub is_correct: Option<bool>,
    pub points_earned: f64,
    pub feedback: Option<String>,
}

//
// ─── ATTEMPT REPORT ────────────────────────────────────────────────────────────
//

/// Shortened test metadata echoed inside a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestBrief {
    pub title: String,
    pub description: Option<String>,
    pub total_points: u32,
    pub passing_score: u8,
}

/// The result summary for one submitted attempt, as returned by the backend.
///
/// Consumed by a results view; the session controller itself never reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptReport {
    pub id: AttemptId,
    pub test_id: TestId,
    pub status: AttemptStatus,
    pub score: f64,
    pub percentage: f64,
    pub passed: bool,
    pub time_spent_seconds: u32,
    pub attempt_number: u32,
    pub submitted_at: Option<DateTime<Utc>>,
    pub test: TestBrief,
    pub answers: Vec<GradedAnswer>,
}

impl AttemptReport {
    /// Number of answers graded as correct so far.
    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|a| a.is_correct == Some(true))
            .count()
    }

    /// True while at least one answer still awaits manual grading.
    #[must_use]
    pub fn has_pending_grading(&self) -> bool {
        self.answers.iter().any(|a| a.is_correct.is_none())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
