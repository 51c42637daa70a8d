//! Google Gemini model implementation.
//!
//! This module provides an implementation of the `Model` trait for Google's
//! `generateContent` API.

use async_trait::async_trait;
use reqwest::Client;
use rover_abstraction::{
    ChatMessage, ChatRole, Model, ModelError, ModelParameters, ModelResponse, ModelUsage,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Default base URL for the Gemini API.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Nucleus sampling mass sent when the caller does not set one.
const DEFAULT_TOP_P: f32 = 0.95;

/// Top-k cutoff sent when the caller does not set one.
const DEFAULT_TOP_K: u32 = 40;

/// Google Gemini model implementation.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    /// The model ID (e.g., "gemini-2.0-flash").
    model_id: String,
    /// The API key for authentication.
    api_key: String,
    /// The base URL for the Gemini API.
    base_url: String,
    /// HTTP client for making requests.
    client: Client,
}

impl GeminiModel {
    /// Creates a new `GeminiModel` with an API key.
    ///
    /// # Arguments
    /// * `model_id` - The Gemini model ID to use
    /// * `api_key` - The API key for authentication
    #[must_use]
    pub fn with_api_key(model_id: String, api_key: String) -> Self {
        Self { model_id, api_key, base_url: GEMINI_BASE_URL.to_string(), client: Client::new() }
    }

    /// Overrides the base URL (e.g. a mock server).
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

    /// Converts our ChatRole to Gemini API role format.
    ///
    /// System messages never reach this point; they travel in `systemInstruction`.
    fn role_to_gemini(role: ChatRole) -> &'static str {
        match role {
            ChatRole::Assistant => "model",
            ChatRole::User | ChatRole::System => "user",
        }
    }

    /// Joins the explicit system prompt and any system-role messages.
    ///
    /// Multiple instructions are joined with "\n\n". Returns `None` when there are none.
    fn system_instruction(messages: &[ChatMessage], system_prompt: Option<&str>) -> Option<String> {
        let parts: Vec<&str> = system_prompt
            .into_iter()
            .chain(
                messages
                    .iter()
                    .filter(|msg| msg.role == ChatRole::System)
                    .map(|msg| msg.content.as_str()),
            )
            .collect();

        if parts.is_empty() { None } else { Some(parts.join("\n\n")) }
    }

    fn build_request(messages: &[ChatMessage], params: &ModelParameters) -> GeminiRequest {
        let contents = messages
            .iter()
            .filter(|msg| msg.role != ChatRole::System)
            .map(|msg| GeminiContent {
                role: Some(Self::role_to_gemini(msg.role).to_string()),
                parts: vec![GeminiPart { text: msg.content.clone() }],
            })
            .collect();

        GeminiRequest {
            contents,
            generation_config: GeminiGenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                top_p: Some(params.top_p.unwrap_or(DEFAULT_TOP_P)),
                top_k: Some(params.top_k.unwrap_or(DEFAULT_TOP_K)),
                stop_sequences: params.stop_sequences.clone(),
            },
            system_instruction: Self::system_instruction(messages, params.system_prompt.as_deref())
                .map(|text| GeminiSystemInstruction { parts: vec![GeminiPart { text }] }),
        }
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        debug!(
            model_id = %self.model_id,
            prompt_len = prompt.len(),
            parameters = ?parameters,
            "GeminiModel generating text"
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
            message_count = messages.len(),
            "GeminiModel generating chat completion"
        );

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_id, self.api_key
        );
        let params = parameters.unwrap_or_default();
        let request_body = Self::build_request(messages, &params);

        let response = self.client.post(&url).json(&request_body).send().await.map_err(|e| {
            error!(error = %e, "Failed to send request to Gemini API");
            ModelError::RequestError(format!("Gemini API request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                status = %status,
                error = %error_text,
                "Gemini API returned error status"
            );

            if status.as_u16() == 402 || status.as_u16() == 429 {
                return Err(ModelError::QuotaExceeded {
                    provider: "gemini".to_string(),
                    message: Some(error_text),
                });
            }

            return Err(ModelError::ModelResponseError(format!(
                "Gemini API error {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini API response");
            ModelError::SerializationError(format!("Failed to parse response: {}", e))
        })?;

        let candidate = gemini_response.candidates.first().ok_or_else(|| {
            error!("No candidates in Gemini API response");
            ModelError::ModelResponseError("No candidates in Gemini response".to_string())
        })?;

        let content = candidate.content.as_ref().ok_or_else(|| {
            ModelError::ModelResponseError("No content in Gemini candidate".to_string())
        })?;

        let text = content
            .parts
            .first()
            .map(|p| p.text.trim())
            .ok_or_else(|| ModelError::ModelResponseError("No parts in Gemini content".to_string()))?;

        if text.is_empty() {
            return Err(ModelError::EmptyResponse("gemini".to_string()));
        }

        let usage = gemini_response.usage_metadata.map(|meta| ModelUsage {
            prompt_tokens: meta.prompt_token_count.unwrap_or(0),
            completion_tokens: meta.candidates_token_count.unwrap_or(0),
            total_tokens: meta.total_token_count.unwrap_or(0),
        });

        Ok(ModelResponse { content: text.to_string(), model_id: Some(self.model_id.clone()), usage })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<GeminiSystemInstruction>,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)] // Matches API naming
struct GeminiUsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}
