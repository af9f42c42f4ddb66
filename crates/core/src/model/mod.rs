mod answer;
mod ids;
mod question;
mod report;
mod test;

pub use answer::{AnswerError, AnswerSheet, AnswerValue};
pub use ids::{AttemptId, ParseIdError, QuestionId, TestId};

pub use question::{ChoiceOption, Question, QuestionError, QuestionKind};
pub use report::{AttemptReport, AttemptStatus, GradedAnswer, ReportError, TestBrief};
pub use test::{Test, TestError};
