use thiserror::Error;

/// A question type label that is neither a bank label nor a canonical token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown question type: {0:?}")]
pub struct QuestionKindError(pub String);

/// A persisted progress status outside `0..=2`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid progress status code: {0}")]
pub struct StatusCodeError(pub i64);
