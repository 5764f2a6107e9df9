use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::QuestionId;
use storage::repository::QuestionRepository;
use tracing::{debug, info, warn};

use super::client::CompletionClient;
use super::prompt::{build_request, parse_response};
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{CompletionError, ExplanationError};

/// Where a returned explanation came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplanationSource {
    /// Stored text returned without an external call.
    Cached,
    /// Freshly generated and parsed from the structured reply.
    Structured,
    /// Freshly generated; the reply was not structured and was kept verbatim.
    RawText,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Explanation {
    pub text: String,
    pub source: ExplanationSource,
}

/// Generates AI explanations on demand and caches them on the question.
#[derive(Clone)]
pub struct ExplanationService {
    questions: Arc<dyn QuestionRepository>,
    client: Arc<dyn CompletionClient>,
    timeout: Duration,
}

impl ExplanationService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            questions,
            client,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Bound on the external call; expiry counts as a call failure.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the cached explanation, or generate and cache a new one.
    ///
    /// With `force` the cache is bypassed. Exactly one external call is made
    /// per uncached invocation; failures are never written to the store.
    ///
    /// # Errors
    ///
    /// Returns `ExplanationError::NotFound` for unknown IDs,
    /// `ExplanationError::Call` when the completion fails or times out, and
    /// `ExplanationError::Storage` on persistence failures.
    pub async fn generate(
        &self,
        id: QuestionId,
        force: bool,
    ) -> Result<Explanation, ExplanationError> {
        let question = self
            .questions
            .get_question(id)
            .await?
            .ok_or(ExplanationError::NotFound(id))?;

        if !force && question.has_ai_explanation() {
            debug!(%id, "explanation cache hit");
            return Ok(Explanation {
                text: question.ai_explanation,
                source: ExplanationSource::Cached,
            });
        }

        let request = build_request(&question)?;
        let raw = match tokio::time::timeout(self.timeout, self.client.complete(&request)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                warn!(%id, error = %err, "explanation request failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(%id, timeout_secs = self.timeout.as_secs(), "explanation request timed out");
                return Err(CompletionError::Timeout(self.timeout.as_secs()).into());
            }
        };

        let explanation = match parse_response(&raw) {
            Some(structured) => Explanation {
                text: structured.render(),
                source: ExplanationSource::Structured,
            },
            None => {
                warn!(%id, "model reply was not structured, caching raw text");
                Explanation {
                    text: raw,
                    source: ExplanationSource::RawText,
                }
            }
        };

        self.questions
            .set_ai_explanation(id, &explanation.text)
            .await?;
        info!(%id, source = ?explanation.source, "cached explanation");
        Ok(explanation)
    }
}
