//! Request/response payloads for the hosted test API, plus conversions into
//! validated domain types. Field names follow the backend exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use exam_core::model::{
    AnswerValue, AttemptId, AttemptReport, AttemptStatus, ChoiceOption, GradedAnswer, Question,
    QuestionId, QuestionKind, Test, TestBrief, TestId,
};

use crate::gateway::ApiError;

fn bad<E: core::fmt::Display>(err: E) -> ApiError {
    ApiError::Transport(err.to_string())
}

//
// ─── TEST PAYLOADS ─────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct TestDoc {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub total_points: u32,
    pub passing_score: u8,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    pub questions: Vec<QuestionDoc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionDoc {
    pub id: u64,
    pub question_type: String,
    pub question_text: String,
    pub points: u32,
    pub order: u32,
    #[serde(default)]
    pub options: Option<Vec<OptionDoc>>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OptionDoc {
    pub text: String,
}

impl TestDoc {
    /// Convert the payload into a validated `Test`.
    ///
    /// Any domain validation failure is a decode failure from the caller's
    /// point of view and maps to `ApiError::Transport`.
    pub(crate) fn into_domain(self) -> Result<Test, ApiError> {
        let questions = self
            .questions
            .into_iter()
            .map(QuestionDoc::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Test::new(
            TestId::new(self.id),
            self.title,
            self.description,
            self.duration_minutes,
            self.total_points,
            self.passing_score,
            self.max_attempts,
            questions,
        )
        .map_err(bad)
    }
}

impl QuestionDoc {
    pub(crate) fn into_domain(self) -> Result<Question, ApiError> {
        let kind = QuestionKind::from_wire(&self.question_type).map_err(bad)?;
        let options = self
            .options
            .unwrap_or_default()
            .into_iter()
            .map(|o| ChoiceOption::new(o.text))
            .collect::<Result<Vec<_>, _>>()
            .map_err(bad)?;

        Question::new(
            QuestionId::new(self.id),
            kind,
            self.question_text,
            self.points,
            self.order,
            options,
            self.image_url,
        )
        .map_err(bad)
    }
}

//
// ─── ATTEMPT PAYLOADS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct StartedAttemptDoc {
    pub id: u64,
}

impl StartedAttemptDoc {
    pub(crate) fn attempt_id(&self) -> AttemptId {
        AttemptId::new(self.id)
    }
}

/// Body for the answer-save endpoint. Exactly one of `answer_text` and
/// `selected_option` is set, depending on the question kind.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerBody {
    pub question_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<u32>,
}

impl AnswerBody {
    pub(crate) fn new(question_id: QuestionId, value: &AnswerValue) -> Self {
        let (answer_text, selected_option) = match value {
            AnswerValue::Text(text) => (Some(text.clone()), None),
            AnswerValue::Choice(index) => (None, Some(*index)),
        };
        Self {
            question_id: question_id.value(),
            answer_text,
            selected_option,
        }
    }
}

/// Error payload shape shared by all endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

//
// ─── REPORT PAYLOADS ───────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct ReportDoc {
    pub id: u64,
    pub test_id: u64,
    pub status: String,
    pub score: f64,
    pub percentage: f64,
    pub passed: bool,
    #[serde(default)]
    pub time_spent_seconds: u32,
    pub attempt_number: u32,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    pub test: TestBriefDoc,
    #[serde(default)]
    pub answers: Vec<GradedAnswerDoc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TestBriefDoc {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub total_points: u32,
    pub passing_score: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GradedAnswerDoc {
    pub question_id: u64,
    #[serde(default)]
    pub answer_text: Option<String>,
    #[serde(default)]
    pub selected_option: Option<u32>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub points_earned: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl ReportDoc {
    pub(crate) fn into_domain(self) -> Result<AttemptReport, ApiError> {
        let status = AttemptStatus::from_wire(&self.status).map_err(bad)?;
        let answers = self
            .answers
            .into_iter()
            .map(GradedAnswerDoc::into_domain)
            .collect();

        Ok(AttemptReport {
            id: AttemptId::new(self.id),
            test_id: TestId::new(self.test_id),
            status,
            score: self.score,
            percentage: self.percentage,
            passed: self.passed,
            time_spent_seconds: self.time_spent_seconds,
            attempt_number: self.attempt_number,
            submitted_at: self.submitted_at,
            test: TestBrief {
                title: self.test.title,
                description: self.test.description,
                total_points: self.test.total_points,
                passing_score: self.test.passing_score,
            },
            answers,
        })
    }
}

impl GradedAnswerDoc {
    fn into_domain(self) -> GradedAnswer {
        let value = match (self.selected_option, self.answer_text) {
            (Some(index), _) => Some(AnswerValue::Choice(index)),
            (None, Some(text)) => Some(AnswerValue::Text(text)),
            (None, None) => None,
        };
        GradedAnswer {
            question_id: QuestionId::new(self.question_id),
            value,
            is_correct: self.is_correct,
            points_earned: self.points_earned,
            feedback: self.feedback,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
