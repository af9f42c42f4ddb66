use thiserror::Error;

use crate::model::{AnswerError, QuestionError, ReportError, TestError};

/// Aggregate error for callers that do not care which model type failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Test(#[from] TestError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
