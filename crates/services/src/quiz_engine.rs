use std::sync::Arc;

use quiz_core::SessionState;
use quiz_core::model::{
    GridItem, ProgressRecord, ProgressStatus, Question, QuestionId, QuestionView, Stats,
    SubmitResult,
};
use storage::repository::{MistakeRepository, ProgressRepository, QuestionRepository, Storage};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::QuizError;

/// Reconciles persisted progress, the mistake book and the mistake-mode
/// session overlay for the single current user.
///
/// Every operation runs under one session lock, which also serializes the
/// read-modify-write sequences on progress and the mistake book.
pub struct QuizEngine {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    mistakes: Arc<dyn MistakeRepository>,
    session: Mutex<SessionState>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
        mistakes: Arc<dyn MistakeRepository>,
    ) -> Self {
        Self {
            questions,
            progress,
            mistakes,
            session: Mutex::new(SessionState::new()),
        }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(
            Arc::clone(&storage.questions),
            Arc::clone(&storage.progress),
            Arc::clone(&storage.mistakes),
        )
    }

    async fn load_question(&self, id: QuestionId) -> Result<Question, QuizError> {
        self.questions
            .get_question(id)
            .await?
            .ok_or(QuizError::NotFound(id))
    }

    async fn load_progress(&self, id: QuestionId) -> Result<ProgressRecord, QuizError> {
        Ok(self
            .progress
            .get_progress(id)
            .await?
            .unwrap_or_else(|| ProgressRecord::unanswered(id)))
    }

    /// The question as currently visible, with mistake-mode status resolution.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for unknown IDs, `QuizError::Storage` on
    /// persistence failures.
    pub async fn question_view(&self, id: QuestionId) -> Result<QuestionView, QuizError> {
        let session = self.session.lock().await;
        let question = self.load_question(id).await?;
        let progress = self.load_progress(id).await?;
        let (status, user_answer) = session.resolve(&progress);
        Ok(QuestionView::build(
            &question,
            status,
            user_answer,
            progress.is_marked,
        ))
    }

    /// Grade a submission, persist it, and track misses in the mistake book.
    ///
    /// Persisted progress is written in every mode; in mistake mode the
    /// outcome is also recorded in the session overlay.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for unknown IDs, `QuizError::Storage` on
    /// persistence failures.
    pub async fn submit_answer(
        &self,
        id: QuestionId,
        answer: &str,
    ) -> Result<SubmitResult, QuizError> {
        let mut session = self.session.lock().await;
        let question = self.load_question(id).await?;
        let mut progress = self.load_progress(id).await?;

        let correct = question.is_correct(answer);
        let status = progress.record_submission(answer, correct);
        self.progress.save_progress(&progress).await?;

        if !correct {
            let misses = self.mistakes.record_miss(id).await?;
            debug!(%id, misses, "recorded miss");
        }
        session.record(id, status, answer);
        debug!(%id, correct, mistake_mode = session.mistake_mode(), "answer submitted");

        Ok(SubmitResult::new(&question, correct))
    }

    /// Flip the persisted mark flag. The session overlay is never involved.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotFound` for unknown IDs, `QuizError::Storage` on
    /// persistence failures.
    pub async fn toggle_mark(&self, id: QuestionId) -> Result<bool, QuizError> {
        let _session = self.session.lock().await;
        self.load_question(id).await?;
        let mut progress = self.load_progress(id).await?;
        let marked = progress.toggle_mark();
        self.progress.save_progress(&progress).await?;
        Ok(marked)
    }

    /// Status grid by ascending ID.
    ///
    /// In mistake mode only mistake-book entries are listed, with statuses
    /// taken from the session overlay.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn grid(&self) -> Result<Vec<GridItem>, QuizError> {
        let session = self.session.lock().await;
        self.grid_locked(&session).await
    }

    async fn grid_locked(&self, session: &SessionState) -> Result<Vec<GridItem>, QuizError> {
        if !session.mistake_mode() {
            let records = self.progress.list_progress().await?;
            return Ok(records
                .into_iter()
                .map(|p| GridItem {
                    id: p.question_id,
                    status: p.status,
                    is_marked: p.is_marked,
                })
                .collect());
        }

        let records = self.progress.list_mistake_progress().await?;
        Ok(records
            .into_iter()
            .map(|p| GridItem {
                id: p.question_id,
                status: session.overlay_status(p.question_id),
                is_marked: p.is_marked,
            })
            .collect())
    }

    /// Switch mistake mode. Enabling starts a fresh review session.
    pub async fn set_mistake_mode(&self, enabled: bool) {
        let mut session = self.session.lock().await;
        session.set_mistake_mode(enabled);
        info!(enabled, "mistake mode changed");
    }

    pub async fn is_mistake_mode(&self) -> bool {
        self.session.lock().await.mistake_mode()
    }

    /// Aggregate counts.
    ///
    /// `total` follows the mode (all questions, or mistake-book size), while
    /// `done` and `correct` always count persisted progress.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn stats(&self) -> Result<Stats, QuizError> {
        let session = self.session.lock().await;
        let total = if session.mistake_mode() {
            self.mistakes.count_mistakes().await?
        } else {
            self.questions.count_questions().await?
        };
        let done = self.progress.count_answered().await?;
        let correct = self
            .progress
            .count_with_status(ProgressStatus::Correct)
            .await?;
        Ok(Stats::from_counts(total, done, correct))
    }

    /// Mistake-book entries whose persisted progress is now `Correct`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn count_correct_mistakes(&self) -> Result<u64, QuizError> {
        let _session = self.session.lock().await;
        Ok(self.mistakes.count_correct_mistakes().await?)
    }

    /// Remove every mistake-book entry whose persisted progress is `Correct`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn clear_correct_mistakes(&self) -> Result<u64, QuizError> {
        let _session = self.session.lock().await;
        let removed = self.mistakes.delete_correct_mistakes().await?;
        info!(removed, "cleared answered mistakes");
        Ok(removed)
    }

    /// Remove one entry from the mistake book regardless of its progress.
    /// Returns whether an entry was removed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn remove_from_mistake_book(&self, id: QuestionId) -> Result<bool, QuizError> {
        let _session = self.session.lock().await;
        Ok(self.mistakes.remove_mistake(id).await?)
    }

    /// The grid entry after `current`, in the current mode.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn next_id(&self, current: QuestionId) -> Result<Option<QuestionId>, QuizError> {
        let grid = self.grid().await?;
        let pos = grid.iter().position(|g| g.id == current);
        Ok(pos.and_then(|i| grid.get(i + 1)).map(|g| g.id))
    }

    /// The grid entry before `current`, in the current mode.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Storage` on persistence failures.
    pub async fn previous_id(
        &self,
        current: QuestionId,
    ) -> Result<Option<QuestionId>, QuizError> {
        let grid = self.grid().await?;
        let pos = grid.iter().position(|g| g.id == current);
        Ok(pos
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| grid.get(i))
            .map(|g| g.id))
    }
}
