//! OpenAI-compatible model implementation.
//!
//! This module provides an implementation of the `Model` trait for the
//! `/chat/completions` wire format. OpenAI itself and Groq both speak it;
//! they differ only in base URL, key, and the label used in error messages.

use async_trait::async_trait;
use reqwest::Client;
use rover_abstraction::{
    ChatMessage, ChatRole, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Default base URL for the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default base URL for Groq's OpenAI-compatible API.
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// OpenAI-compatible model implementation.
#[derive(Debug, Clone)]
pub struct OpenAIModel {
    /// The model ID (e.g., "gpt-4o", "openai/gpt-oss-120b").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the API, without trailing slash.
    base_url: String,
    /// Provider label used in logs and errors ("openai", "groq").
    provider: &'static str,
    /// HTTP client for making requests.
    client: Client,
}

impl OpenAIModel {
    /// Creates a new `OpenAIModel` talking to the OpenAI API.
    ///
    /// # Arguments
    /// * `model_id` - The OpenAI model ID to use
    /// * `api_key` - The API key for authentication
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self {
            model_id,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            provider: "openai",
            client: Client::new(),
        }
    }

    /// Creates a new `OpenAIModel` talking to Groq.
    #[must_use]
    pub fn groq(model_id: String, api_key: String) -> Self {
        Self {
            model_id,
            api_key,
            base_url: GROQ_BASE_URL.to_string(),
            provider: "groq",
            client: Client::new(),
        }
    }

    /// Overrides the base URL (e.g. a proxy or a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the HTTP client (used to apply request timeouts).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Provider label ("openai" or "groq").
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Builds the wire message list, putting the system instruction first.
    fn build_messages(
        messages: &[ChatMessage],
        system_prompt: Option<&str>,
    ) -> Vec<OpenAIMessage> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        if let Some(system) = system_prompt {
            wire.push(OpenAIMessage { role: ChatRole::System.as_str().to_string(), content: system.to_string() });
        }
        wire.extend(messages.iter().map(|msg| OpenAIMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        }));
        wire
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            provider = self.provider,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "OpenAIModel generating text"
        );

        let messages = vec![ChatMessage::user(prompt)];
        self.generate_chat_completion(&messages, parameters).await
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            provider = self.provider,
            message_count = messages.len(),
            "OpenAIModel generating chat completion"
        );

        let url = format!("{}/chat/completions", self.base_url);
        let params = parameters.unwrap_or_default();

        let request_body = OpenAIRequest {
            model: self.model_id.clone(),
            messages: Self::build_messages(messages, params.system_prompt.as_deref()),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stop: params.stop_sequences,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, provider = self.provider, "Failed to send chat completion request");
                ModelError::RequestError(format!(
                    "{} API request failed: {}",
                    self.provider.to_uppercase(),
                    e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                provider = self.provider,
                error = %error_text,
                "Chat completion API returned error status"
            );

            if status.as_u16() == 402 || status.as_u16() == 429 {
                return Err(ModelError::QuotaExceeded {
                    provider: self.provider.to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "{} API error {}: {}",
                self.provider.to_uppercase(),
                status.as_u16(),
                error_text
            )));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse chat completion response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let choice = openai_response.choices.first().ok_or_else(|| {
            error!("No choices in chat completion response");
            ModelError::ModelResponseError("No choices in response".to_string())
        })?;

        let content = choice.message.content.as_deref().map(str::trim).unwrap_or_default();
        if content.is_empty() {
            return Err(ModelError::EmptyResponse(self.provider.to_string()));
        }

        let usage = openai_response.usage.map(|u| ModelUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ModelResponse {
            content: content.to_string(),
            model_id: Some(self.model_id.clone()),
            usage,
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// OpenAI API request/response structures

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
