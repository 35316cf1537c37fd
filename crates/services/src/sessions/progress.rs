use iq_core::model::TestSession;

/// Aggregated view of session progress, useful for front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub is_first: bool,
    pub is_last: bool,
    /// Position of the cursor through the test, in whole percent.
    pub percent: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn from_session(session: &TestSession) -> Self {
        let total = session.len();
        let position = session.cursor() + 1;
        let percent = if total == 0 {
            0
        } else {
            u32::try_from(position * 100 / total).unwrap_or(100)
        };
        Self {
            total,
            answered: session.answered_count(),
            current_index: session.cursor(),
            is_first: session.is_first(),
            is_last: session.is_last(),
            percent,
            is_complete: session.is_completed(),
        }
    }
}
