mod client;
mod prompt;
mod service;

pub use client::{ChatCompletionClient, CompletionClient, CompletionRequest};
pub use prompt::{SYSTEM_INSTRUCTION, StructuredExplanation, build_request, parse_response};
pub use service::{Explanation, ExplanationService, ExplanationSource};
