//! Shapes of the public `/api/generate-content` endpoint.

use crate::chat::ChatMessage;
use serde::{Deserialize, Serialize};

pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "The AI service is temporarily unavailable due to high load. Please try again shortly.";

pub const INTERNAL_ERROR_MESSAGE: &str = "AI Error";

pub const INVALID_BODY_MESSAGE: &str = "Request body must be a valid JSON object.";

/// Body of `POST /api/generate-content`.
///
/// `guideURL` is the older single-guide field; it is folded into the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default, rename = "guideURLs")]
    pub guide_urls: Option<Vec<String>>,
    #[serde(default, rename = "guideURL")]
    pub guide_url: Option<String>,
}

impl GenerateRequest {
    pub fn history(&self) -> &[ChatMessage] {
        self.chat_history.as_deref().unwrap_or_default()
    }

    /// Every guide URL of the request, trimmed, blank ones removed,
    /// duplicates collapsed to their first occurrence.
    pub fn guide_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        let candidates = self
            .guide_urls
            .iter()
            .flatten()
            .chain(self.guide_url.iter());

        for url in candidates.map(|u| u.trim()).filter(|u| !u.is_empty()) {
            if !urls.iter().any(|seen| seen == url) {
                urls.push(url.to_string());
            }
        }
        urls
    }
}

/// Body returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateResponse {
    Success { success: bool, text: String },
    Failure { error: String },
}

impl GenerateResponse {
    pub fn success(text: impl Into<String>) -> Self {
        GenerateResponse::Success {
            success: true,
            text: text.into(),
        }
    }
}

/// What the caller is allowed to learn about a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCategory {
    BadRequest(String),
    ServiceUnavailable,
    Internal,
}

impl ErrorCategory {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCategory::BadRequest(_) => 400,
            ErrorCategory::ServiceUnavailable => 503,
            ErrorCategory::Internal => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrorCategory::BadRequest(message) => message,
            ErrorCategory::ServiceUnavailable => SERVICE_UNAVAILABLE_MESSAGE,
            ErrorCategory::Internal => INTERNAL_ERROR_MESSAGE,
        }
    }

    pub fn to_response(&self) -> GenerateResponse {
        GenerateResponse::Failure {
            error: self.message().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRole;

    #[test]
    fn test_parse_full_request() {
        let body = r#"{
            "prompt": "How do I play Jett?",
            "chatHistory": [
                {"role": "assistant", "content": "Hello! How can I help you today?"},
                {"role": "user", "content": "Hi"}
            ],
            "systemInstruction": "You are a VALORANT coach.",
            "guideURLs": ["https://a.example", "https://b.example"]
        }"#;
        let request: GenerateRequest = serde_json::from_str(body).unwrap();

        assert_eq!(request.prompt.as_deref(), Some("How do I play Jett?"));
        assert_eq!(request.history().len(), 2);
        assert_eq!(request.history()[0].role, ChatRole::Assistant);
        assert_eq!(
            request.guide_urls(),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_parse_empty_request() {
        let request: GenerateRequest = serde_json::from_str("{}").unwrap();
        assert!(request.prompt.is_none());
        assert!(request.history().is_empty());
        assert!(request.guide_urls().is_empty());
    }

    #[test]
    fn test_null_history_is_empty() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"prompt": "x", "chatHistory": null}"#).unwrap();
        assert!(request.history().is_empty());
    }

    #[test]
    fn test_singular_guide_url_is_folded_in() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"prompt": "x", "guideURLs": ["https://a.example", " "], "guideURL": "https://c.example"}"#,
        )
        .unwrap();
        assert_eq!(
            request.guide_urls(),
            vec!["https://a.example", "https://c.example"]
        );
    }

    #[test]
    fn test_duplicate_guide_urls_collapse() {
        let request = GenerateRequest {
            guide_urls: Some(vec![
                "https://a.example".to_string(),
                " https://a.example ".to_string(),
            ]),
            guide_url: Some("https://a.example".to_string()),
            ..Default::default()
        };
        assert_eq!(request.guide_urls(), vec!["https://a.example"]);
    }

    #[test]
    fn test_unknown_role_fails_to_parse() {
        let body = r#"{"chatHistory": [{"role": "system", "content": "x"}]}"#;
        assert!(serde_json::from_str::<GenerateRequest>(body).is_err());
    }

    #[test]
    fn test_success_response_shape() {
        let json = serde_json::to_value(GenerateResponse::success("done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "text": "done"}));
    }

    #[test]
    fn test_error_categories() {
        let bad = ErrorCategory::BadRequest("Prompt is required.".to_string());
        assert_eq!(bad.status_code(), 400);
        assert_eq!(
            serde_json::to_value(bad.to_response()).unwrap(),
            serde_json::json!({"error": "Prompt is required."})
        );

        assert_eq!(ErrorCategory::ServiceUnavailable.status_code(), 503);
        assert_eq!(
            ErrorCategory::ServiceUnavailable.message(),
            SERVICE_UNAVAILABLE_MESSAGE
        );
        assert_eq!(ErrorCategory::Internal.status_code(), 500);
        assert_eq!(ErrorCategory::Internal.message(), "AI Error");
    }
}
