use std::fmt;
use thiserror::Error;
use url::Url;

use crate::model::answer::{AnswerError, AnswerValue};
use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("unknown question kind: {0}")]
    UnknownKind(String),

    #[error("multiple-choice question needs at least 2 options, got {found}")]
    NotEnoughOptions { found: usize },

    #[error("{kind} question does not take options")]
    UnexpectedOptions { kind: QuestionKind },

    #[error("option text cannot be empty")]
    EmptyOptionText,

    #[error("question points must be > 0")]
    ZeroPoints,

    #[error("invalid question image url: {0}")]
    InvalidImageUrl(String),
}

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

/// The four question formats the platform supports.
///
/// Only `MultipleChoice` answers by option index; the other three answer with
/// free text (true/false as the literal text `"true"` or `"false"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortText,
    Essay,
}

impl QuestionKind {
    /// Parses the backend's kind discriminator.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::UnknownKind` for unrecognized values.
    pub fn from_wire(value: &str) -> Result<Self, QuestionError> {
        match value {
            "mcq" => Ok(Self::MultipleChoice),
            "true_false" => Ok(Self::TrueFalse),
            "short_text" => Ok(Self::ShortText),
            "essay" => Ok(Self::Essay),
            other => Err(QuestionError::UnknownKind(other.to_string())),
        }
    }

    /// The discriminator the backend uses for this kind.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "mcq",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::ShortText => "short_text",
            QuestionKind::Essay => "essay",
        }
    }

    /// True when answers are given as an option index rather than text.
    #[must_use]
    pub fn is_choice_based(self) -> bool {
        matches!(self, QuestionKind::MultipleChoice)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

//
// ─── CHOICE OPTION ─────────────────────────────────────────────────────────────
//

/// One selectable option of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    text: String,
}

impl ChoiceOption {
    /// Creates an option with non-empty display text.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyOptionText` if the text is blank.
    pub fn new(text: impl Into<String>) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyOptionText);
        }
        Ok(Self {
            text: text.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single question within a test.
///
/// Construction validates the kind/options pairing so a loaded question can
/// always be rendered and answered without further checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    kind: QuestionKind,
    text: String,
    points: u32,
    display_order: u32,
    options: Vec<ChoiceOption>,
    image_url: Option<Url>,
}

impl Question {
    /// Creates a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is empty, points are zero, the
    /// image URL fails to parse, or the options do not match the kind
    /// (multiple-choice needs at least two, every other kind takes none).
    pub fn new(
        id: QuestionId,
        kind: QuestionKind,
        text: impl Into<String>,
        points: u32,
        display_order: u32,
        options: Vec<ChoiceOption>,
        image_url: Option<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if points == 0 {
            return Err(QuestionError::ZeroPoints);
        }
        if kind.is_choice_based() {
            if options.len() < 2 {
                return Err(QuestionError::NotEnoughOptions {
                    found: options.len(),
                });
            }
        } else if !options.is_empty() {
            return Err(QuestionError::UnexpectedOptions { kind });
        }

        let image_url = image_url
            .map(|raw| Url::parse(raw.trim()).map_err(|_| QuestionError::InvalidImageUrl(raw)))
            .transpose()?;

        Ok(Self {
            id,
            kind,
            text: text.trim().to_owned(),
            points,
            display_order,
            options,
            image_url,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    /// Position assigned by the test author; tests sort questions by it.
    #[must_use]
    pub fn display_order(&self) -> u32 {
        self.display_order
    }

    #[must_use]
    pub fn options(&self) -> &[ChoiceOption] {
        &self.options
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    /// Checks that an answer value fits this question's kind.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError` when the value variant does not match the kind
    /// or a choice index points past the available options.
    pub fn validate_answer(&self, value: &AnswerValue) -> Result<(), AnswerError> {
        match (self.kind.is_choice_based(), value) {
            (true, AnswerValue::Choice(index)) => {
                let available = u32::try_from(self.options.len()).unwrap_or(u32::MAX);
                if *index >= available {
                    return Err(AnswerError::ChoiceOutOfRange {
                        index: *index,
                        available,
                    });
                }
                Ok(())
            }
            (true, AnswerValue::Text(_)) => Err(AnswerError::ExpectedChoice),
            (false, AnswerValue::Choice(_)) => Err(AnswerError::ExpectedText),
            (false, AnswerValue::Text(_)) => Ok(()),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
