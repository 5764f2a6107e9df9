//! Typed ingestion of the external question bank.
//!
//! The bank is a JSON array of records produced by an offline preprocessing
//! step:
//!
//! ```json
//! [{"id": 1, "type": "单选题", "content": "...", "options": ["A. ..."],
//!   "answer": "A", "explanation": "...", "ai_explanation": ""}]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::error::QuestionKindError;
use crate::model::{Question, QuestionId, QuestionKind};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question {id}: {source}")]
    Kind {
        id: QuestionId,
        #[source]
        source: QuestionKindError,
    },
    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

#[derive(Debug, Deserialize)]
struct BankEntry {
    id: u64,
    #[serde(rename = "type")]
    kind: String,
    content: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    answer: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    ai_explanation: Option<String>,
}

impl BankEntry {
    fn into_question(self) -> Result<Question, BankError> {
        let id = QuestionId::new(self.id);
        let kind = QuestionKind::parse(&self.kind).map_err(|source| BankError::Kind { id, source })?;
        Ok(Question {
            id,
            kind,
            content: self.content,
            options: self.options.unwrap_or_default(),
            answer: self.answer,
            explanation: self.explanation,
            ai_explanation: self.ai_explanation.unwrap_or_default(),
        })
    }
}

/// The ordered question sequence available at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if two questions share an ID.
    pub fn from_questions(questions: Vec<Question>) -> Result<Self, BankError> {
        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(BankError::DuplicateId(q.id));
            }
        }
        Ok(Self { questions })
    }

    /// # Errors
    ///
    /// Returns `BankError` for malformed JSON, unknown question types, or
    /// duplicate IDs.
    pub fn from_json_str(raw: &str) -> Result<Self, BankError> {
        let entries: Vec<BankEntry> = serde_json::from_str(raw)?;
        let questions = entries
            .into_iter()
            .map(BankEntry::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_questions(questions)
    }

    /// # Errors
    ///
    /// Returns `BankError::Io` if the file cannot be read, otherwise the
    /// same errors as [`QuestionBank::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| BankError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"[
        {"id": 1, "type": "单选题", "content": "Q1", "options": ["A. x", "B. y"], "answer": "B", "explanation": "e1"},
        {"id": 2, "type": "判断题", "content": "Q2", "options": null, "answer": "A", "explanation": "", "ai_explanation": "seeded"}
    ]"#;

    #[test]
    fn parses_bank_records() {
        let bank = QuestionBank::from_json_str(SAMPLE).unwrap();
        assert_eq!(bank.len(), 2);

        let first = &bank.questions()[0];
        assert_eq!(first.kind, QuestionKind::SingleChoice);
        assert_eq!(first.options, vec!["A. x".to_string(), "B. y".to_string()]);
        assert!(first.ai_explanation.is_empty());

        let second = &bank.questions()[1];
        assert_eq!(second.kind, QuestionKind::TrueFalse);
        assert!(second.options.is_empty());
        assert_eq!(second.ai_explanation, "seeded");
    }

    #[test]
    fn rejects_unknown_type() {
        let err = QuestionBank::from_json_str(r#"[{"id": 9, "type": "essay", "content": "x"}]"#)
            .unwrap_err();
        assert!(matches!(err, BankError::Kind { id, .. } if id == QuestionId::new(9)));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let raw = r#"[
            {"id": 1, "type": "单选题", "content": "a"},
            {"id": 1, "type": "单选题", "content": "b"}
        ]"#;
        let err = QuestionBank::from_json_str(raw).unwrap_err();
        assert!(matches!(err, BankError::DuplicateId(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let bank = QuestionBank::from_path(file.path()).unwrap();
        assert_eq!(bank.len(), 2);

        let missing = QuestionBank::from_path(file.path().with_extension("missing"));
        assert!(matches!(missing, Err(BankError::Io { .. })));
    }
}
