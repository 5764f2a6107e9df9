//! Prompt construction and response parsing for question explanations.

use quiz_core::model::Question;
use serde::Deserialize;

use super::client::CompletionRequest;

pub const SYSTEM_INSTRUCTION: &str =
    "You are a study assistant helping a student review exam questions. Always reply with a JSON object.";

/// Shape the model is asked to return. Missing fields render empty.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StructuredExplanation {
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub analysis: String,
}

impl StructuredExplanation {
    /// Fixed display format stored in the question's AI-explanation field.
    #[must_use]
    pub fn render(&self) -> String {
        format!("AI explanation\nAnswer: {}\nAnalysis: {}", self.answer, self.analysis)
    }
}

/// Build the completion request for `question`.
///
/// # Errors
///
/// Returns `serde_json::Error` if the options cannot be serialized.
pub fn build_request(question: &Question) -> Result<CompletionRequest, serde_json::Error> {
    let options = serde_json::to_string(&question.options)?;
    let prompt = format!(
        "Explain the following exam question.\n\
         Question: {content}\n\
         Options: {options}\n\
         \n\
         Requirements:\n\
         1. Use background knowledge relevant to the question.\n\
         2. Reply with a valid JSON object containing exactly two string fields: \
         \"answer\" (your answer, e.g. \"A\" or \"A,C\") and \"analysis\" (a detailed explanation).\n\
         3. Keep the analysis clear and well reasoned, in the same language as the question.\n",
        content = question.content,
    );
    Ok(CompletionRequest {
        system: SYSTEM_INSTRUCTION.to_string(),
        prompt,
        json_object: true,
    })
}

/// Parse the structured reply. `None` when the text is not a JSON object or a
/// field has the wrong type.
#[must_use]
pub fn parse_response(raw: &str) -> Option<StructuredExplanation> {
    serde_json::from_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionId, QuestionKind};

    fn question() -> Question {
        Question {
            id: QuestionId::new(1),
            kind: QuestionKind::MultiChoice,
            content: "Which are primary colours?".into(),
            options: vec!["A. red".into(), "B. green".into(), "C. \"blue\"".into()],
            answer: "A,C".into(),
            explanation: String::new(),
            ai_explanation: String::new(),
        }
    }

    #[test]
    fn prompt_embeds_content_and_serialized_options() {
        let request = build_request(&question()).unwrap();
        assert!(request.json_object);
        assert_eq!(request.system, SYSTEM_INSTRUCTION);
        assert!(request.prompt.contains("Which are primary colours?"));
        assert!(request.prompt.contains(r#"["A. red","B. green","C. \"blue\""]"#));
        assert!(request.prompt.contains("\"analysis\""));
    }

    #[test]
    fn parses_structured_reply() {
        let parsed = parse_response(r#"{"answer": "A,C", "analysis": "because"}"#).unwrap();
        assert_eq!(parsed.answer, "A,C");
        assert_eq!(parsed.render(), "AI explanation\nAnswer: A,C\nAnalysis: because");
    }

    #[test]
    fn partial_object_renders_missing_fields_empty() {
        let parsed = parse_response(r#"{"answer": "A"}"#).unwrap();
        assert_eq!(parsed.answer, "A");
        assert!(parsed.analysis.is_empty());
        assert_eq!(parsed.render(), "AI explanation\nAnswer: A\nAnalysis: ");
    }

    #[test]
    fn rejects_free_text_and_mistyped_fields() {
        assert!(parse_response("The answer is A because...").is_none());
        assert!(parse_response(r#"{"answer": 1, "analysis": "x"}"#).is_none());
        assert!(parse_response(r#"["A"]"#).is_none());
    }
}
