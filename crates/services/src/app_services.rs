use std::sync::Arc;
use std::time::Duration;

use quiz_core::QuestionBank;
use storage::repository::Storage;

use crate::bank_service::{QuestionBankService, SyncReport};
use crate::config::{DEFAULT_TIMEOUT_SECS, ExplanationConfig};
use crate::error::AppServicesError;
use crate::explanation::{ChatCompletionClient, CompletionClient, ExplanationService};
use crate::quiz_engine::QuizEngine;

/// Assembles app-facing services over one storage backend and syncs the
/// question bank into it.
#[derive(Clone)]
pub struct AppServices {
    sync_report: SyncReport,
    engine: Arc<QuizEngine>,
    explanations: Arc<ExplanationService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization, bank sync, or
    /// HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        bank: &QuestionBank,
        config: Option<ExplanationConfig>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let timeout = config
            .as_ref()
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), |c| c.timeout);
        let client = Arc::new(ChatCompletionClient::new(config)?);
        Self::from_storage(&storage, bank, client, timeout).await
    }

    /// Build services over an existing storage with an explicit completion client.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Sync` if the bank cannot be synced.
    pub async fn from_storage(
        storage: &Storage,
        bank: &QuestionBank,
        client: Arc<dyn CompletionClient>,
        timeout: Duration,
    ) -> Result<Self, AppServicesError> {
        let sync_report = QuestionBankService::new(Arc::clone(&storage.questions))
            .sync(bank)
            .await?;
        let engine = Arc::new(QuizEngine::from_storage(storage));
        let explanations = Arc::new(
            ExplanationService::new(Arc::clone(&storage.questions), client).with_timeout(timeout),
        );

        Ok(Self {
            sync_report,
            engine,
            explanations,
        })
    }

    /// Outcome of the bank sync performed at startup.
    #[must_use]
    pub fn sync_report(&self) -> SyncReport {
        self.sync_report
    }

    #[must_use]
    pub fn engine(&self) -> Arc<QuizEngine> {
        Arc::clone(&self.engine)
    }

    #[must_use]
    pub fn explanations(&self) -> Arc<ExplanationService> {
        Arc::clone(&self.explanations)
    }
}
