#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod model;
pub mod session;

pub use bank::{BankError, QuestionBank};
pub use session::SessionState;
