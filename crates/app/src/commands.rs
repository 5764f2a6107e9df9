use anyhow::Context;
use clap::Subcommand;
use quiz_core::model::QuestionId;
use serde_json::json;
use services::AppServices;

/// Operations available both as one-shot commands and inside `review`.
#[derive(Debug, Subcommand)]
pub enum Action {
    /// Show a question with its current status
    Show { id: QuestionId },

    /// Submit an answer, e.g. `A` or `A,C`
    Submit { id: QuestionId, answer: String },

    /// Toggle the mark flag
    Mark { id: QuestionId },

    /// Status of every question in the current mode
    Grid,

    /// The question after `id` in the current grid
    Next { id: QuestionId },

    /// The question before `id` in the current grid
    Prev { id: QuestionId },

    /// Progress counters
    Stats,

    /// Show or generate the AI explanation
    Explain {
        id: QuestionId,

        /// Regenerate even when an explanation is cached
        #[arg(long)]
        force: bool,
    },

    /// Remove mistake-book entries that are now answered correctly
    ClearCorrect,

    /// Remove one question from the mistake book
    Forget { id: QuestionId },
}

/// Run one action and render its result as pretty JSON.
pub async fn execute(services: &AppServices, action: Action) -> anyhow::Result<String> {
    let engine = services.engine();
    let value = match action {
        Action::Show { id } => serde_json::to_value(engine.question_view(id).await?)?,
        Action::Submit { id, answer } => {
            serde_json::to_value(engine.submit_answer(id, &answer).await?)?
        }
        Action::Mark { id } => {
            let is_marked = engine.toggle_mark(id).await?;
            json!({ "id": id, "is_marked": is_marked })
        }
        Action::Grid => serde_json::to_value(engine.grid().await?)?,
        Action::Next { id } => json!({ "id": engine.next_id(id).await? }),
        Action::Prev { id } => json!({ "id": engine.previous_id(id).await? }),
        Action::Stats => serde_json::to_value(engine.stats().await?)?,
        Action::Explain { id, force } => {
            let explanation = services.explanations().generate(id, force).await?;
            json!({ "id": id, "ai_explanation": explanation.text })
        }
        Action::ClearCorrect => {
            let removed = engine.clear_correct_mistakes().await?;
            json!({ "removed": removed })
        }
        Action::Forget { id } => {
            let removed = engine.remove_from_mistake_book(id).await?;
            json!({ "id": id, "removed": removed })
        }
    };
    serde_json::to_string_pretty(&value).context("rendering output")
}
