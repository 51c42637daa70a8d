//! Model implementations for CodeRover.
//!
//! This crate provides concrete implementations of the `Model` trait.
//!
//! # Supported Providers
//!
//! - **Mock**: Offline testing and development
//! - **Gemini**: Google's Gemini models (API key required)
//! - **OpenAI**: OpenAI's GPT models (API key required)
//! - **Groq**: Hosted open models over the OpenAI wire format (API key required)

pub mod factory;
pub mod gemini;
pub mod openai;
pub mod retry;

use async_trait::async_trait;
use rover_abstraction::{
    ChatMessage, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
};
use tracing::debug;

pub use factory::{ModelConfig, ModelFactory, ModelType};
pub use gemini::GeminiModel;
pub use openai::OpenAIModel;
pub use retry::RetryModel;

/// A deterministic `Model` that echoes its input, for offline runs.
#[derive(Debug, Default)]
pub struct MockModel {
    id: String,
}

impl MockModel {
    /// Creates a new `MockModel` with the given ID.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self { id }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "MockModel generating text"
        );

        let temperature = parameters.and_then(|p| p.temperature).unwrap_or_default();
        let content = format!("# {} (temperature {temperature:.1})\n{prompt}", self.id);

        Ok(response(&self.id, count_tokens(prompt), content))
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.id,
            message_count = messages.len(),
            parameters = ?parameters,
            "MockModel generating chat completion"
        );

        let last = messages.last().map_or("", |m| m.content.as_str());
        let content = format!("{} received: {last}", self.id);
        let prompt_tokens = messages.iter().map(|m| count_tokens(&m.content)).sum::<u32>();

        Ok(response(&self.id, prompt_tokens, content))
    }

    fn model_id(&self) -> &str {
        &self.id
    }
}

fn response(model_id: &str, prompt_tokens: u32, content: String) -> ModelResponse {
    let completion_tokens = count_tokens(&content);
    ModelResponse {
        content,
        model_id: Some(model_id.to_string()),
        usage: Some(ModelUsage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }),
    }
}

/// Count tokens in a string (simplified: word count).
fn count_tokens(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}
