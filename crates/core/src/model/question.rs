use serde::{Deserialize, Serialize};

use crate::error::QuestionKindError;
use crate::model::ids::QuestionId;

//
// ─── QUESTION KIND ─────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    TrueFalse,
}

impl QuestionKind {
    /// Canonical storage token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::MultiChoice => "multi_choice",
            QuestionKind::TrueFalse => "true_false",
        }
    }

    /// Label used by the question bank files.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::SingleChoice => "单选题",
            QuestionKind::MultiChoice => "多选题",
            QuestionKind::TrueFalse => "判断题",
        }
    }

    /// Parse either a bank label or a canonical token.
    ///
    /// # Errors
    ///
    /// Returns `QuestionKindError` for anything else.
    pub fn parse(raw: &str) -> Result<Self, QuestionKindError> {
        match raw.trim() {
            "single_choice" | "单选题" => Ok(QuestionKind::SingleChoice),
            "multi_choice" | "多选题" => Ok(QuestionKind::MultiChoice),
            "true_false" | "判断题" => Ok(QuestionKind::TrueFalse),
            other => Err(QuestionKindError(other.to_string())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A stored question.
///
/// `answer` is a single letter or comma-joined letters for multi-choice
/// questions; submissions are compared against it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionKind,
    pub content: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
    pub ai_explanation: String,
}

impl Question {
    /// Exact, case- and whitespace-sensitive comparison with the canonical answer.
    #[must_use]
    pub fn is_correct(&self, submitted: &str) -> bool {
        self.answer == submitted
    }

    #[must_use]
    pub fn has_ai_explanation(&self) -> bool {
        !self.ai_explanation.is_empty()
    }

    /// Field-level differences between this stored row and a bank revision.
    ///
    /// Only kind, options and answer are compared. Returns `None` when the
    /// bank revision matches.
    #[must_use]
    pub fn correction_from(&self, revision: &Question) -> Option<QuestionCorrection> {
        let correction = QuestionCorrection {
            kind: (self.kind != revision.kind).then_some(revision.kind),
            options: (self.options != revision.options).then(|| revision.options.clone()),
            answer: (self.answer != revision.answer).then(|| revision.answer.clone()),
        };
        (!correction.is_empty()).then_some(correction)
    }

    /// Apply a correction in place, leaving every other field untouched.
    pub fn apply_correction(&mut self, correction: &QuestionCorrection) {
        if let Some(kind) = correction.kind {
            self.kind = kind;
        }
        if let Some(options) = &correction.options {
            self.options.clone_from(options);
        }
        if let Some(answer) = &correction.answer {
            self.answer.clone_from(answer);
        }
    }
}

/// Changed fields produced by reconciling a stored question against the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionCorrection {
    pub kind: Option<QuestionKind>,
    pub options: Option<Vec<String>>,
    pub answer: Option<String>,
}

impl QuestionCorrection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.options.is_none() && self.answer.is_none()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            id: QuestionId::new(7),
            kind: QuestionKind::SingleChoice,
            content: "Pick one".into(),
            options: vec!["A. one".into(), "B. two".into()],
            answer: "B".into(),
            explanation: "because".into(),
            ai_explanation: "cached".into(),
        }
    }

    #[test]
    fn parses_bank_labels_and_tokens() {
        assert_eq!(QuestionKind::parse("多选题").unwrap(), QuestionKind::MultiChoice);
        assert_eq!(QuestionKind::parse("判断题").unwrap(), QuestionKind::TrueFalse);
        assert_eq!(
            QuestionKind::parse("single_choice").unwrap(),
            QuestionKind::SingleChoice
        );
        assert!(QuestionKind::parse("essay").is_err());
    }

    #[test]
    fn answer_comparison_is_exact() {
        let mut q = question();
        assert!(q.is_correct("B"));
        assert!(!q.is_correct("b"));
        assert!(!q.is_correct(" B"));

        q.answer = "A,C".into();
        assert!(q.is_correct("A,C"));
        assert!(!q.is_correct("C,A"));
    }

    #[test]
    fn identical_revision_needs_no_correction() {
        let q = question();
        let mut revision = q.clone();
        revision.ai_explanation.clear();
        revision.explanation = "reworded".into();
        assert_eq!(q.correction_from(&revision), None);
    }

    #[test]
    fn correction_keeps_ai_explanation() {
        let mut q = question();
        let mut revision = q.clone();
        revision.kind = QuestionKind::MultiChoice;
        revision.answer = "A,B".into();
        revision.ai_explanation.clear();

        let correction = q.correction_from(&revision).unwrap();
        assert_eq!(correction.kind, Some(QuestionKind::MultiChoice));
        assert_eq!(correction.options, None);
        assert_eq!(correction.answer.as_deref(), Some("A,B"));

        q.apply_correction(&correction);
        assert_eq!(q.kind, QuestionKind::MultiChoice);
        assert_eq!(q.answer, "A,B");
        assert_eq!(q.ai_explanation, "cached");
    }
}
