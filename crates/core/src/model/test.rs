use thiserror::Error;

use crate::model::ids::{QuestionId, TestId};
use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test title cannot be empty")]
    EmptyTitle,

    #[error("test has no questions")]
    NoQuestions,

    #[error("test duration must be > 0 minutes when set")]
    InvalidDuration,

    #[error("passing score must be a percentage between 0 and 100, got {0}")]
    InvalidPassingScore(u8),

    #[error("max attempts must be > 0 when set")]
    InvalidMaxAttempts,

    #[error("duplicate question id: {0}")]
    DuplicateQuestionId(QuestionId),
}

//
// ─── TEST ──────────────────────────────────────────────────────────────────────
//

/// A test as published to students: metadata plus an ordered question list.
///
/// Questions are sorted by their author-assigned display order at
/// construction, so index-based navigation matches what the author laid out.
/// A test without `duration_minutes` is untimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    id: TestId,
    title: String,
    description: Option<String>,
    duration_minutes: Option<u32>,
    total_points: u32,
    passing_score: u8,
    max_attempts: Option<u32>,
    questions: Vec<Question>,
}

impl Test {
    /// Creates a new test.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the title is blank, the question list is empty
    /// or contains duplicate ids, a declared duration or attempt limit is
    /// zero, or the passing score exceeds 100.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        description: Option<String>,
        duration_minutes: Option<u32>,
        total_points: u32,
        passing_score: u8,
        max_attempts: Option<u32>,
        mut questions: Vec<Question>,
    ) -> Result<Self, TestError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if questions.is_empty() {
            return Err(TestError::NoQuestions);
        }
        if duration_minutes == Some(0) {
            return Err(TestError::InvalidDuration);
        }
        if passing_score > 100 {
            return Err(TestError::InvalidPassingScore(passing_score));
        }
        if max_attempts == Some(0) {
            return Err(TestError::InvalidMaxAttempts);
        }

        let mut seen = std::collections::HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(TestError::DuplicateQuestionId(question.id()));
            }
        }

        questions.sort_by_key(Question::display_order);

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            duration_minutes,
            total_points,
            passing_score,
            max_attempts,
            questions,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> TestId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration_minutes
    }

    /// The full time budget in seconds, or `None` for untimed tests.
    #[must_use]
    pub fn duration_secs(&self) -> Option<u32> {
        self.duration_minutes.map(|m| m.saturating_mul(60))
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.duration_minutes.is_some()
    }

    #[must_use]
    pub fn total_points(&self) -> u32 {
        self.total_points
    }

    /// Minimum percentage required to pass.
    #[must_use]
    pub fn passing_score(&self) -> u8 {
        self.passing_score
    }

    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Index of a question in display order, if it belongs to this test.
    #[must_use]
    pub fn position_of(&self, id: QuestionId) -> Option<usize> {
        self.questions.iter().position(|q| q.id() == id)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{ChoiceOption, QuestionKind};

    fn question(id: u64, order: u32) -> Question {
        Question::new(
            QuestionId::new(id),
            QuestionKind::ShortText,
            format!("Question {id}"),
            1,
            order,
            Vec::new(),
            None,
        )
        .unwrap()
    }

    fn mcq(id: u64, order: u32) -> Question {
        let options = vec![
            ChoiceOption::new("first").unwrap(),
            ChoiceOption::new("second").unwrap(),
        ];
        Question::new(
            QuestionId::new(id),
            QuestionKind::MultipleChoice,
            format!("Question {id}"),
            2,
            order,
            options,
            None,
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_title() {
        let err = Test::new(
            TestId::new(1),
            "  ",
            None,
            Some(30),
            10,
            70,
            None,
            vec![question(1, 0)],
        )
        .unwrap_err();
        assert_eq!(err, TestError::EmptyTitle);
    }

    #[test]
    fn rejects_empty_question_list() {
        let err = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(30),
            10,
            70,
            None,
            Vec::new(),
        )
        .unwrap_err();
        assert_eq!(err, TestError::NoQuestions);
    }

    #[test]
    fn rejects_zero_duration_and_zero_attempt_limit() {
        let err = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(0),
            10,
            70,
            None,
            vec![question(1, 0)],
        )
        .unwrap_err();
        assert_eq!(err, TestError::InvalidDuration);

        let err = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(30),
            10,
            70,
            Some(0),
            vec![question(1, 0)],
        )
        .unwrap_err();
        assert_eq!(err, TestError::InvalidMaxAttempts);
    }

    #[test]
    fn rejects_passing_score_over_100() {
        let err = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(30),
            10,
            101,
            None,
            vec![question(1, 0)],
        )
        .unwrap_err();
        assert_eq!(err, TestError::InvalidPassingScore(101));
    }

    #[test]
    fn rejects_duplicate_question_ids() {
        let err = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(30),
            10,
            70,
            None,
            vec![question(7, 0), question(7, 1)],
        )
        .unwrap_err();
        assert_eq!(err, TestError::DuplicateQuestionId(QuestionId::new(7)));
    }

    #[test]
    fn sorts_questions_by_display_order() {
        let test = Test::new(
            TestId::new(1),
            "Biology quiz",
            None,
            Some(30),
            10,
            70,
            None,
            vec![question(3, 2), mcq(1, 0), question(2, 1)],
        )
        .unwrap();

        let ids: Vec<_> = test.questions().iter().map(Question::id).collect();
        assert_eq!(
            ids,
            vec![QuestionId::new(1), QuestionId::new(2), QuestionId::new(3)]
        );
        assert_eq!(test.position_of(QuestionId::new(3)), Some(2));
        assert_eq!(test.question_at(0).unwrap().id(), QuestionId::new(1));
    }

    #[test]
    fn duration_conversion_and_untimed() {
        let timed = Test::new(
            TestId::new(1),
            "Timed",
            None,
            Some(45),
            10,
            70,
            Some(3),
            vec![question(1, 0)],
        )
        .unwrap();
        assert!(timed.is_timed());
        assert_eq!(timed.duration_secs(), Some(2700));
        assert_eq!(timed.max_attempts(), Some(3));

        let untimed = Test::new(
            TestId::new(2),
            "Untimed",
            None,
            None,
            10,
            70,
            None,
            vec![question(1, 0)],
        )
        .unwrap();
        assert!(!untimed.is_timed());
        assert_eq!(untimed.duration_secs(), None);
    }

    #[test]
    fn trims_title_and_filters_empty_description() {
        let test = Test::new(
            TestId::new(1),
            "  Algebra midterm  ",
            Some("   ".into()),
            None,
            20,
            60,
            None,
            vec![question(1, 0)],
        )
        .unwrap();

        assert_eq!(test.title(), "Algebra midterm");
        assert_eq!(test.description(), None);
    }
}
