use super::service::SessionStatus;

/// Aggregated view of attempt progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub cursor: usize,
    pub remaining_secs: Option<u32>,
    pub status: SessionStatus,
}

impl SessionProgress {
    /// True once the attempt has been finalized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Submitted
    }

    /// Number of questions still without an answer.
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}
