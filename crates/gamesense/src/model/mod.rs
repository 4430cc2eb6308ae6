mod gemini;

use crate::error::ModelError;
use async_trait::async_trait;
use gamesense_core::payload::ModelRequest;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// A hosted text-generation service.
///
/// One call is one attempt; retrying is the dispatcher's job.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, ModelError>;
}
