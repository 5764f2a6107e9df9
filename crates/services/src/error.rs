//! Shared error types for the services crate.

use quiz_core::model::QuestionId;
use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `QuizEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankSyncError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by a `CompletionClient`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompletionError {
    #[error("AI explanations are not configured")]
    Disabled,
    #[error("completion returned an empty response")]
    EmptyResponse,
    #[error("completion request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("completion request timed out after {0}s")]
    Timeout(u64),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `ExplanationService`.
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExplanationError {
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error("AI generation failed: {0}")]
    Call(#[from] CompletionError),
    #[error("could not build prompt: {0}")]
    Prompt(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Sync(#[from] BankSyncError),
    #[error(transparent)]
    Completion(#[from] CompletionError),
}
