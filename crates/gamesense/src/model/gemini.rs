use super::ModelClient;
use crate::error::ModelError;
use crate::prelude::*;
use async_trait::async_trait;
use gamesense_core::gemini::{self, GenerateContentResponse};
use gamesense_core::payload::ModelRequest;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Gemini `generateContent` over REST.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|e| eyre!("Invalid API key header value: {}", e))?;
        api_key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: f!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
        })
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&gemini::to_wire(request))
            .send()
            .await
            .map_err(|e| ModelError::Unknown(f!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::from_status(
                status.as_u16(),
                gemini::error_message(&body),
            ));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Unknown(f!("invalid response body: {e}")))?;

        gemini::response_text(&body)
            .ok_or_else(|| ModelError::Unknown(gemini::empty_response_reason(&body)))
    }
}
