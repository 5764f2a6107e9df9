use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StatusCodeError;
use crate::model::ids::QuestionId;

/// Answer status of a question.
///
/// Serialized as its integer code (`0`, `1`, `2`) at every boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProgressStatus {
    #[default]
    Unanswered,
    Correct,
    Wrong,
}

impl ProgressStatus {
    #[must_use]
    pub fn from_outcome(correct: bool) -> Self {
        if correct {
            ProgressStatus::Correct
        } else {
            ProgressStatus::Wrong
        }
    }

    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            ProgressStatus::Unanswered => 0,
            ProgressStatus::Correct => 1,
            ProgressStatus::Wrong => 2,
        }
    }

    /// # Errors
    ///
    /// Returns `StatusCodeError` for codes outside `0..=2`.
    pub fn from_code(code: i64) -> Result<Self, StatusCodeError> {
        match code {
            0 => Ok(ProgressStatus::Unanswered),
            1 => Ok(ProgressStatus::Correct),
            2 => Ok(ProgressStatus::Wrong),
            other => Err(StatusCodeError(other)),
        }
    }

    #[must_use]
    pub fn is_answered(self) -> bool {
        self != ProgressStatus::Unanswered
    }
}

impl Serialize for ProgressStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for ProgressStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        ProgressStatus::from_code(code).map_err(serde::de::Error::custom)
    }
}

/// Persisted per-question progress. One record exists for every question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub question_id: QuestionId,
    pub status: ProgressStatus,
    pub user_answer: String,
    pub is_marked: bool,
}

impl ProgressRecord {
    #[must_use]
    pub fn unanswered(question_id: QuestionId) -> Self {
        Self {
            question_id,
            status: ProgressStatus::Unanswered,
            user_answer: String::new(),
            is_marked: false,
        }
    }

    /// Overwrite the previous submission with a new one.
    pub fn record_submission(&mut self, answer: &str, correct: bool) -> ProgressStatus {
        self.status = ProgressStatus::from_outcome(correct);
        answer.clone_into(&mut self.user_answer);
        self.status
    }

    /// Flip the marked flag and return the new value.
    pub fn toggle_mark(&mut self) -> bool {
        self.is_marked = !self.is_marked;
        self.is_marked
    }
}
