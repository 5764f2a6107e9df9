use crate::model::ids::QuestionId;

/// Mistake-book entry: a question answered incorrectly at least once since
/// it was last swept out of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MistakeEntry {
    pub question_id: QuestionId,
    pub count: u32,
}

impl MistakeEntry {
    #[must_use]
    pub fn first_miss(question_id: QuestionId) -> Self {
        Self {
            question_id,
            count: 1,
        }
    }

    /// Count one more miss and return the new total.
    pub fn record_miss(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }
}
