use std::collections::HashMap;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised when an answer does not fit the question it targets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question expects a text answer, got an option choice")]
    ExpectedText,

    #[error("question expects an option choice, got a text answer")]
    ExpectedChoice,

    #[error("selected option {index} is out of range (question has {available} options)")]
    ChoiceOutOfRange { index: u32, available: u32 },
}

//
// ─── ANSWER VALUE ──────────────────────────────────────────────────────────────
//

/// A student's answer to a single question.
///
/// Multiple-choice questions carry the zero-based index of the chosen option;
/// every other kind carries free text. True/false answers travel as the text
/// `"true"` or `"false"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValue {
    Choice(u32),
    Text(String),
}

impl AnswerValue {
    /// Convenience constructor for a text answer.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Convenience constructor for an option choice.
    #[must_use]
    pub fn choice(index: u32) -> Self {
        Self::Choice(index)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(t) => Some(t),
            AnswerValue::Choice(_) => None,
        }
    }

    #[must_use]
    pub fn as_choice(&self) -> Option<u32> {
        match self {
            AnswerValue::Choice(i) => Some(*i),
            AnswerValue::Text(_) => None,
        }
    }
}

//
// ─── ANSWER SHEET ──────────────────────────────────────────────────────────────
//

/// All answers recorded during one attempt, keyed by question.
///
/// Holds at most one answer per question; recording again replaces the
/// previous value and returns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSheet {
    entries: HashMap<QuestionId, AnswerValue>,
}

impl AnswerSheet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Record an answer, replacing any earlier one for the same question.
    ///
    /// Returns the replaced value, if any.
    pub fn record(&mut self, question_id: QuestionId, value: AnswerValue) -> Option<AnswerValue> {
        self.entries.insert(question_id, value)
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&AnswerValue> {
        self.entries.get(&question_id)
    }

    #[must_use]
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.entries.contains_key(&question_id)
    }

    /// Number of questions with a recorded answer.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &AnswerValue)> {
        self.entries.iter().map(|(id, value)| (*id, value))
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_returns_none_for_first_answer() {
        let mut sheet = AnswerSheet::new();
        let prior = sheet.record(QuestionId::new(1), AnswerValue::choice(2));
        assert_eq!(prior, None);
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn record_replaces_and_returns_previous_answer() {
        let mut sheet = AnswerSheet::new();
        sheet.record(QuestionId::new(1), AnswerValue::choice(0));
        let prior = sheet.record(QuestionId::new(1), AnswerValue::choice(3));

        assert_eq!(prior, Some(AnswerValue::choice(0)));
        assert_eq!(sheet.get(QuestionId::new(1)), Some(&AnswerValue::choice(3)));
        assert_eq!(sheet.answered_count(), 1);
    }

    #[test]
    fn answered_count_tracks_distinct_questions() {
        let mut sheet = AnswerSheet::new();
        sheet.record(QuestionId::new(1), AnswerValue::text("true"));
        sheet.record(QuestionId::new(2), AnswerValue::text("photosynthesis"));
        sheet.record(QuestionId::new(1), AnswerValue::text("false"));

        assert_eq!(sheet.answered_count(), 2);
        assert!(sheet.is_answered(QuestionId::new(2)));
        assert!(!sheet.is_answered(QuestionId::new(3)));
    }

    #[test]
    fn value_accessors_match_variant() {
        assert_eq!(AnswerValue::choice(4).as_choice(), Some(4));
        assert_eq!(AnswerValue::choice(4).as_text(), None);
        assert_eq!(AnswerValue::text("ok").as_text(), Some("ok"));
        assert_eq!(AnswerValue::text("ok").as_choice(), None);
    }
}
