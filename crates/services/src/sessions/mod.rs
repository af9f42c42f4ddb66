mod countdown;
mod progress;
mod report;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::Countdown;
pub use progress::SessionProgress;
pub use report::ReportService;
pub use service::{SessionStatus, TestSession, Tick};
pub use workflow::{SessionController, SessionPhase, SubmitOutcome};
