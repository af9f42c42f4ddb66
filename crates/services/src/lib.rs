#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use exam_core::Clock;
pub use sessions as session;

pub use error::SessionError;

pub use sessions::{
    Countdown, ReportService, SessionController, SessionPhase, SessionProgress, SessionStatus,
    SubmitOutcome, TestSession, Tick,
};
