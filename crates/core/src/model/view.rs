//! View models handed to the presentation layer.

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::progress::ProgressStatus;
use crate::model::question::{Question, QuestionKind};

/// A question as the user currently sees it.
///
/// `explanation` and `correct_answer` are only populated once the resolved
/// status is no longer `Unanswered`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: QuestionId,
    #[serde(rename = "type", with = "kind_label")]
    pub kind: QuestionKind,
    pub content: String,
    pub options: Vec<String>,
    pub user_answer: String,
    pub status: ProgressStatus,
    pub is_marked: bool,
    pub ai_explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

/// The presentation layer sees the bank's own type label.
mod kind_label {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::model::question::QuestionKind;

    pub fn serialize<S: Serializer>(kind: &QuestionKind, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(kind.label())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<QuestionKind, D::Error> {
        let raw = String::deserialize(deserializer)?;
        QuestionKind::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl QuestionView {
    #[must_use]
    pub fn build(
        question: &Question,
        status: ProgressStatus,
        user_answer: String,
        is_marked: bool,
    ) -> Self {
        let revealed = status.is_answered();
        Self {
            id: question.id,
            kind: question.kind,
            content: question.content.clone(),
            options: question.options.clone(),
            user_answer,
            status,
            is_marked,
            ai_explanation: question.ai_explanation.clone(),
            explanation: revealed.then(|| question.explanation.clone()),
            correct_answer: revealed.then(|| question.answer.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResult {
    pub correct: bool,
    pub explanation: String,
    pub correct_answer: String,
    pub ai_explanation: String,
}

impl SubmitResult {
    #[must_use]
    pub fn new(question: &Question, correct: bool) -> Self {
        Self {
            correct,
            explanation: question.explanation.clone(),
            correct_answer: question.answer.clone(),
            ai_explanation: question.ai_explanation.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub id: QuestionId,
    pub status: ProgressStatus,
    pub is_marked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub done: u64,
    pub correct: u64,
    pub accuracy: String,
}

impl Stats {
    /// Accuracy is `correct / done` as a one-decimal percentage, or `"0%"`
    /// before anything has been answered.
    #[must_use]
    pub fn from_counts(total: u64, done: u64, correct: u64) -> Self {
        let accuracy = if done == 0 {
            "0%".to_string()
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = correct as f64 / done as f64;
            format!("{:.1}%", ratio * 100.0)
        };
        Self {
            total,
            done,
            correct,
            accuracy,
        }
    }
}
