use std::sync::Arc;

use api::{ApiError, AttemptGateway};
use exam_core::model::{AttemptId, AttemptReport};

/// Read side of a finished attempt: fetches the graded report.
#[derive(Clone)]
pub struct ReportService {
    attempts: Arc<dyn AttemptGateway>,
}

impl ReportService {
    #[must_use]
    pub fn new(attempts: Arc<dyn AttemptGateway>) -> Self {
        Self { attempts }
    }

    /// Fetch the report for an attempt.
    ///
    /// Right after submission parts of it may still await manual grading;
    /// `AttemptReport::has_pending_grading` tells the two states apart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for unknown attempts, `Transport` on
    /// network or decode failures.
    pub async fn fetch(&self, attempt_id: AttemptId) -> Result<AttemptReport, ApiError> {
        self.attempts.fetch_report(attempt_id).await
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
