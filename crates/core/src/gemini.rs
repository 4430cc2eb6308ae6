//! Wire format of the Gemini `generateContent` endpoint.

use crate::chat::ModelRole;
use crate::payload::ModelRequest;
use serde::{Deserialize, Serialize};

/// Longest upstream error body echoed into logs.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ModelRole>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<ModelRole>, text: &str) -> Self {
        Self {
            role,
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

/// Convert the provider-neutral request to the Gemini body.
pub fn to_wire(request: &ModelRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: request
            .contents
            .iter()
            .map(|turn| Content::text(Some(turn.role), &turn.text))
            .collect(),
        system_instruction: request
            .system_instruction
            .as_deref()
            .map(|text| Content::text(None, text)),
    }
}

/// Text of the first candidate, if the model produced any.
pub fn response_text(response: &GenerateContentResponse) -> Option<String> {
    let content = response.candidates.first()?.content.as_ref()?;
    let text: String = content
        .parts
        .iter()
        .filter_map(|part| part.text.as_deref())
        .collect();

    (!text.trim().is_empty()).then_some(text)
}

/// Why a response carried no text, for logging.
pub fn empty_response_reason(response: &GenerateContentResponse) -> String {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return format!("prompt blocked: {reason}");
    }

    match response
        .candidates
        .first()
        .and_then(|c| c.finish_reason.as_deref())
    {
        Some(reason) => format!("no text in response (finish reason: {reason})"),
        None => "no candidates in response".to_string(),
    }
}

/// Readable message from an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => match envelope.error.status {
            Some(status) => format!("{status}: {}", envelope.error.message),
            None => envelope.error.message,
        },
        Err(_) => crate::guide::truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
    }
}
