#![forbid(unsafe_code)]

pub mod app_services;
pub mod bank_service;
pub mod config;
pub mod error;
pub mod explanation;
pub mod quiz_engine;

pub use app_services::AppServices;
pub use bank_service::{QuestionBankService, SyncReport};
pub use config::ExplanationConfig;
pub use error::{AppServicesError, BankSyncError, CompletionError, ExplanationError, QuizError};
pub use explanation::{
    ChatCompletionClient, CompletionClient, CompletionRequest, Explanation, ExplanationService,
    ExplanationSource,
};
pub use quiz_engine::QuizEngine;
