//! Mistake-mode session state.
//!
//! While mistake mode is on, reads resolve a question's status from an
//! in-memory overlay instead of persisted progress, so reviewing the mistake
//! book starts every entry over as unanswered without touching history.

use std::collections::HashMap;

use crate::model::{ProgressRecord, ProgressStatus, QuestionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayEntry {
    pub status: ProgressStatus,
    pub answer: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionState {
    mistake_mode: bool,
    overlay: HashMap<QuestionId, OverlayEntry>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mistake_mode(&self) -> bool {
        self.mistake_mode
    }

    /// Set the mode flag. Enabling always starts from an empty overlay.
    pub fn set_mistake_mode(&mut self, enabled: bool) {
        self.mistake_mode = enabled;
        if enabled {
            self.reset();
        }
    }

    /// Discard every overlay entry.
    pub fn reset(&mut self) {
        self.overlay.clear();
    }

    /// Remember a submission made during this review session.
    ///
    /// No-op outside mistake mode.
    pub fn record(&mut self, id: QuestionId, status: ProgressStatus, answer: &str) {
        if !self.mistake_mode {
            return;
        }
        self.overlay.insert(
            id,
            OverlayEntry {
                status,
                answer: answer.to_string(),
            },
        );
    }

    /// Status of `id` within the overlay; absent entries are `Unanswered`.
    #[must_use]
    pub fn overlay_status(&self, id: QuestionId) -> ProgressStatus {
        self.overlay
            .get(&id)
            .map_or(ProgressStatus::Unanswered, |entry| entry.status)
    }

    /// Status and user answer a reader should see for `record`.
    #[must_use]
    pub fn resolve(&self, record: &ProgressRecord) -> (ProgressStatus, String) {
        if !self.mistake_mode {
            return (record.status, record.user_answer.clone());
        }
        match self.overlay.get(&record.question_id) {
            Some(entry) => (entry.status, entry.answer.clone()),
            None => (ProgressStatus::Unanswered, String::new()),
        }
    }

    #[must_use]
    pub fn overlay_len(&self) -> usize {
        self.overlay.len()
    }
}
