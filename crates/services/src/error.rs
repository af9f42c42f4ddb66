//! Shared error types for the services crate.

use thiserror::Error;

use api::ApiError;
use exam_core::model::{AnswerError, QuestionId};

/// Errors emitted by the session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session was already initialized")]
    AlreadyInitialized,
    #[error("attempt already submitted")]
    AlreadySubmitted,
    #[error("question {0} is not part of this test")]
    UnknownQuestion(QuestionId),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
