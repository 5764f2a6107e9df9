use std::sync::Arc;

use quiz_core::QuestionBank;
use storage::repository::QuestionRepository;
use tracing::{debug, info, warn};

use crate::error::BankSyncError;

/// Outcome of bringing the question store in line with the bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncReport {
    /// The store was empty and every bank question was inserted.
    Loaded { inserted: u64 },
    /// The store was populated; `updated` rows were corrected and `missing`
    /// bank entries had no stored row.
    Reconciled { updated: u64, missing: u64 },
}

/// Loads the external bank into the question store and reconciles later revisions.
#[derive(Clone)]
pub struct QuestionBankService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Startup entry point: load into an empty store, reconcile otherwise.
    ///
    /// # Errors
    ///
    /// Returns `BankSyncError::Storage` on persistence failures.
    pub async fn sync(&self, bank: &QuestionBank) -> Result<SyncReport, BankSyncError> {
        if self.questions.count_questions().await? == 0 {
            let inserted = self.load(bank).await?;
            Ok(SyncReport::Loaded { inserted })
        } else {
            self.reconcile(bank).await
        }
    }

    /// Insert every bank question with an unanswered progress record.
    ///
    /// # Errors
    ///
    /// Returns `BankSyncError::Storage` on persistence failures, including a
    /// conflict when the store is not empty.
    pub async fn load(&self, bank: &QuestionBank) -> Result<u64, BankSyncError> {
        let inserted = self.questions.insert_bank(bank.questions()).await?;
        info!(inserted, "loaded question bank");
        Ok(inserted)
    }

    /// Correct kind, options and answer of stored questions that changed in
    /// the bank. Never inserts or deletes.
    ///
    /// # Errors
    ///
    /// Returns `BankSyncError::Storage` on persistence failures.
    pub async fn reconcile(&self, bank: &QuestionBank) -> Result<SyncReport, BankSyncError> {
        let mut updated = 0_u64;
        let mut missing = 0_u64;

        for revision in bank.questions() {
            let Some(stored) = self.questions.get_question(revision.id).await? else {
                missing += 1;
                continue;
            };
            let Some(correction) = stored.correction_from(revision) else {
                continue;
            };
            debug!(id = %revision.id, ?correction, "correcting stored question");
            self.questions
                .update_question_fields(revision.id, &correction)
                .await?;
            updated += 1;
        }

        if missing > 0 {
            // New bank entries only enter through the empty-store load path.
            warn!(missing, "bank questions absent from the store were not inserted");
        }
        info!(updated, "reconciled question bank");
        Ok(SyncReport::Reconciled { updated, missing })
    }
}
