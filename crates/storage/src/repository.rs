use async_trait::async_trait;
use quiz_core::model::{
    MistakeEntry, ProgressRecord, ProgressStatus, Question, QuestionCorrection, QuestionId,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for question content.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Number of stored questions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_questions(&self) -> Result<u64, StorageError>;

    /// Insert bank questions together with an unanswered progress record for
    /// each, as a single unit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if any question already exists; nothing
    /// is written in that case.
    async fn insert_bank(&self, questions: &[Question]) -> Result<u64, StorageError>;

    /// Fetch a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError>;

    /// Overwrite only the fields present in `correction`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question_fields(
        &self,
        id: QuestionId,
        correction: &QuestionCorrection,
    ) -> Result<(), StorageError>;

    /// Store the generated AI explanation for a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn set_ai_explanation(&self, id: QuestionId, text: &str) -> Result<(), StorageError>;
}

/// Repository contract for per-question progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(&self, id: QuestionId) -> Result<Option<ProgressRecord>, StorageError>;

    /// Insert or replace a progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;

    /// All progress records by ascending question ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Progress records of questions in the mistake book, by ascending ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_mistake_progress(&self) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Records with any status other than `Unanswered`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_answered(&self) -> Result<u64, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_with_status(&self, status: ProgressStatus) -> Result<u64, StorageError>;
}

/// Repository contract for the mistake book.
#[async_trait]
pub trait MistakeRepository: Send + Sync {
    /// Insert an entry with count 1, or increment an existing one. Returns the
    /// new count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn record_miss(&self, id: QuestionId) -> Result<u32, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_mistake(&self, id: QuestionId) -> Result<Option<MistakeEntry>, StorageError>;

    /// All entries by ascending question ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_mistakes(&self) -> Result<Vec<MistakeEntry>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_mistakes(&self) -> Result<u64, StorageError>;

    /// Entries whose persisted progress is currently `Correct`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn count_correct_mistakes(&self) -> Result<u64, StorageError>;

    /// Delete entries whose persisted progress is currently `Correct`. Returns
    /// the number removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_correct_mistakes(&self) -> Result<u64, StorageError>;

    /// Remove one entry regardless of progress. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn remove_mistake(&self, id: QuestionId) -> Result<bool, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    progress: Arc<Mutex<BTreeMap<QuestionId, ProgressRecord>>>,
    mistakes: Arc<Mutex<BTreeMap<QuestionId, MistakeEntry>>>,
}

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    m.lock().map_err(|e| StorageError::Connection(e.to_string()))
}

fn count_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn count_questions(&self) -> Result<u64, StorageError> {
        Ok(count_u64(lock(&self.questions)?.len()))
    }

    async fn insert_bank(&self, questions: &[Question]) -> Result<u64, StorageError> {
        let mut stored = lock(&self.questions)?;
        let mut progress = lock(&self.progress)?;
        if questions.iter().any(|q| stored.contains_key(&q.id)) {
            return Err(StorageError::Conflict);
        }
        for q in questions {
            stored.insert(q.id, q.clone());
            progress.insert(q.id, ProgressRecord::unanswered(q.id));
        }
        Ok(count_u64(questions.len()))
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, StorageError> {
        Ok(lock(&self.questions)?.get(&id).cloned())
    }

    async fn update_question_fields(
        &self,
        id: QuestionId,
        correction: &QuestionCorrection,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.questions)?;
        let question = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        question.apply_correction(correction);
        Ok(())
    }

    async fn set_ai_explanation(&self, id: QuestionId, text: &str) -> Result<(), StorageError> {
        let mut guard = lock(&self.questions)?;
        let question = guard.get_mut(&id).ok_or(StorageError::NotFound)?;
        text.clone_into(&mut question.ai_explanation);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, id: QuestionId) -> Result<Option<ProgressRecord>, StorageError> {
        Ok(lock(&self.progress)?.get(&id).cloned())
    }

    async fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        lock(&self.progress)?.insert(record.question_id, record.clone());
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        Ok(lock(&self.progress)?.values().cloned().collect())
    }

    async fn list_mistake_progress(&self) -> Result<Vec<ProgressRecord>, StorageError> {
        let progress = lock(&self.progress)?;
        let mistakes = lock(&self.mistakes)?;
        Ok(mistakes
            .keys()
            .filter_map(|id| progress.get(id).cloned())
            .collect())
    }

    async fn count_answered(&self) -> Result<u64, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(count_u64(guard.values().filter(|p| p.status.is_answered()).count()))
    }

    async fn count_with_status(&self, status: ProgressStatus) -> Result<u64, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(count_u64(guard.values().filter(|p| p.status == status).count()))
    }
}

#[async_trait]
impl MistakeRepository for InMemoryRepository {
    async fn record_miss(&self, id: QuestionId) -> Result<u32, StorageError> {
        let mut guard = lock(&self.mistakes)?;
        let count = match guard.get_mut(&id) {
            Some(entry) => entry.record_miss(),
            None => {
                guard.insert(id, MistakeEntry::first_miss(id));
                1
            }
        };
        Ok(count)
    }

    async fn get_mistake(&self, id: QuestionId) -> Result<Option<MistakeEntry>, StorageError> {
        Ok(lock(&self.mistakes)?.get(&id).copied())
    }

    async fn list_mistakes(&self) -> Result<Vec<MistakeEntry>, StorageError> {
        Ok(lock(&self.mistakes)?.values().copied().collect())
    }

    async fn count_mistakes(&self) -> Result<u64, StorageError> {
        Ok(count_u64(lock(&self.mistakes)?.len()))
    }

    async fn count_correct_mistakes(&self) -> Result<u64, StorageError> {
        let progress = lock(&self.progress)?;
        let mistakes = lock(&self.mistakes)?;
        let n = mistakes
            .keys()
            .filter(|id| progress.get(id).is_some_and(|p| p.status == ProgressStatus::Correct))
            .count();
        Ok(count_u64(n))
    }

    async fn delete_correct_mistakes(&self) -> Result<u64, StorageError> {
        let progress = lock(&self.progress)?;
        let mut mistakes = lock(&self.mistakes)?;
        let before = mistakes.len();
        mistakes.retain(|id, _| {
            progress
                .get(id)
                .is_none_or(|p| p.status != ProgressStatus::Correct)
        });
        Ok(count_u64(before - mistakes.len()))
    }

    async fn remove_mistake(&self, id: QuestionId) -> Result<bool, StorageError> {
        Ok(lock(&self.mistakes)?.remove(&id).is_some())
    }
}

/// Aggregates the quiz repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub mistakes: Arc<dyn MistakeRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    /// Use one repository value for every store.
    #[must_use]
    pub fn from_repository<R>(repo: R) -> Self
    where
        R: QuestionRepository + ProgressRepository + MistakeRepository + Clone + 'static,
    {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let mistakes: Arc<dyn MistakeRepository> = Arc::new(repo);
        Self {
            questions,
            progress,
            mistakes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionKind;

    fn build_question(id: u64, answer: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            kind: QuestionKind::SingleChoice,
            content: format!("Question {id}"),
            options: vec!["A. yes".into(), "B. no".into()],
            answer: answer.into(),
            explanation: String::new(),
            ai_explanation: String::new(),
        }
    }

    fn progress(id: u64, status: ProgressStatus) -> ProgressRecord {
        ProgressRecord {
            question_id: QuestionId::new(id),
            status,
            user_answer: "A".into(),
            is_marked: false,
        }
    }

    #[tokio::test]
    async fn insert_bank_creates_progress() {
        let repo = InMemoryRepository::new();
        let inserted = repo
            .insert_bank(&[build_question(2, "A"), build_question(1, "B")])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(repo.count_questions().await.unwrap(), 2);

        let all = repo.list_progress().await.unwrap();
        let ids: Vec<u64> = all.iter().map(|p| p.question_id.value()).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(all.iter().all(|p| p.status == ProgressStatus::Unanswered));
    }

    #[tokio::test]
    async fn insert_bank_is_all_or_nothing() {
        let repo = InMemoryRepository::new();
        repo.insert_bank(&[build_question(1, "A")]).await.unwrap();

        let err = repo
            .insert_bank(&[build_question(2, "A"), build_question(1, "A")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.count_questions().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn record_miss_increments() {
        let repo = InMemoryRepository::new();
        let id = QuestionId::new(5);
        assert_eq!(repo.record_miss(id).await.unwrap(), 1);
        assert_eq!(repo.record_miss(id).await.unwrap(), 2);
        assert_eq!(repo.get_mistake(id).await.unwrap().unwrap().count, 2);
    }

    #[tokio::test]
    async fn sweeps_only_correct_mistakes() {
        let repo = InMemoryRepository::new();
        repo.insert_bank(&[build_question(1, "A"), build_question(2, "A")])
            .await
            .unwrap();
        repo.save_progress(&progress(1, ProgressStatus::Correct)).await.unwrap();
        repo.save_progress(&progress(2, ProgressStatus::Wrong)).await.unwrap();
        repo.record_miss(QuestionId::new(1)).await.unwrap();
        repo.record_miss(QuestionId::new(2)).await.unwrap();

        assert_eq!(repo.count_correct_mistakes().await.unwrap(), 1);
        assert_eq!(repo.delete_correct_mistakes().await.unwrap(), 1);

        let left: Vec<u64> = repo
            .list_mistakes()
            .await
            .unwrap()
            .iter()
            .map(|m| m.question_id.value())
            .collect();
        assert_eq!(left, vec![2]);
    }

    #[tokio::test]
    async fn mistake_progress_follows_the_ledger() {
        let repo = InMemoryRepository::new();
        repo.insert_bank(&[build_question(1, "A"), build_question(2, "A"), build_question(3, "A")])
            .await
            .unwrap();
        repo.record_miss(QuestionId::new(3)).await.unwrap();
        repo.record_miss(QuestionId::new(1)).await.unwrap();

        let ids: Vec<u64> = repo
            .list_mistake_progress()
            .await
            .unwrap()
            .iter()
            .map(|p| p.question_id.value())
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn updates_missing_question_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo
            .set_ai_explanation(QuestionId::new(1), "text")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
