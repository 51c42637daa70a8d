//! Model factory for creating model instances from configuration.
//!
//! The provider is resolved once, either explicitly or from the model ID,
//! and every keyed provider gets a reqwest client carrying the configured
//! request timeout.

use crate::{GeminiModel, MockModel, OpenAIModel, RetryModel};
use reqwest::Client;
use rover_abstraction::{Model, ModelError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Model type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelType {
    /// Mock model for testing.
    Mock,
    /// Google Gemini model.
    Gemini,
    /// OpenAI model.
    OpenAI,
    /// Groq-hosted model (OpenAI wire format).
    Groq,
}

impl ModelType {
    /// Resolves the provider from a model ID.
    ///
    /// Gemini IDs contain "gemini". Groq serves ids containing "groq",
    /// "mixtral", "llama" or "qwen", and the "openai/gpt-oss" family; that
    /// check runs before the OpenAI one since those IDs also contain "gpt".
    pub fn detect(model_id: &str) -> Result<Self, ModelError> {
        let id = model_id.to_lowercase();

        if id.contains("gemini") {
            Ok(Self::Gemini)
        } else if ["groq", "mixtral", "llama", "qwen"].iter().any(|k| id.contains(k))
            || id.starts_with("openai/gpt-oss")
        {
            Ok(Self::Groq)
        } else if id.contains("gpt") || id.contains("openai") {
            Ok(Self::OpenAI)
        } else if id.contains("mock") {
            Ok(Self::Mock)
        } else {
            error!(model_id = %model_id, "Cannot determine provider for model");
            Err(ModelError::UnsupportedModelProvider(format!("Unknown model: {}", model_id)))
        }
    }

    /// Lowercase provider name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::Groq => "groq",
        }
    }

    /// Whether the provider needs an API key.
    pub const fn requires_api_key(self) -> bool {
        !matches!(self, Self::Mock)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(Self::Mock),
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "groq" => Ok(Self::Groq),
            _ => Err(()),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// The type of model to create.
    pub model_type: ModelType,
    /// The model ID (e.g., "gemini-2.0-flash", "openai/gpt-oss-120b").
    pub model_id: String,
    /// API key; required by every provider except Mock.
    pub api_key: Option<String>,
    /// Optional base URL overriding the provider default.
    pub base_url: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Total attempts per generation; values above 1 enable `RetryModel`.
    pub max_retries: u32,
}

impl ModelConfig {
    /// Creates a new `ModelConfig` with the given type and model ID.
    ///
    /// # Arguments
    /// * `model_type` - The type of model
    /// * `model_id` - The model ID
    #[must_use]
    pub fn new(model_type: ModelType, model_id: String) -> Self {
        Self {
            model_type,
            model_id,
            api_key: None,
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: crate::retry::DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a configuration whose provider is detected from the model ID.
    pub fn detect(model_id: &str) -> Result<Self, ModelError> {
        Ok(Self::new(ModelType::detect(model_id)?, model_id.to_string()))
    }

    /// Sets the API key for this configuration.
    #[must_use]
    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Sets the base URL for this configuration.
    ///
    /// # Arguments
    /// * `base_url` - The base URL for the API endpoint (e.g., "http://localhost:8000/v1")
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the request timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the total number of attempts per generation.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Factory for creating model instances.
pub struct ModelFactory;

impl ModelFactory {
    /// Creates a model instance from the given configuration.
    ///
    /// # Errors
    /// Returns `ModelError::UnsupportedModelProvider` when a keyed provider has
    /// no API key, or `ModelError::RequestError` if the HTTP client cannot be built.
    pub fn create(config: &ModelConfig) -> Result<Arc<dyn Model>, ModelError> {
        debug!(
            model_type = %config.model_type,
            model_id = %config.model_id,
            timeout_secs = config.timeout_secs,
            max_retries = config.max_retries,
            "Creating model instance"
        );

        let model: Arc<dyn Model> = match config.model_type {
            ModelType::Mock => Arc::new(MockModel::new(config.model_id.clone())),
            ModelType::Gemini => {
                let mut model =
                    GeminiModel::with_api_key(config.model_id.clone(), Self::api_key(config)?)
                        .with_client(Self::client(config)?);
                if let Some(base_url) = &config.base_url {
                    model = model.with_base_url(base_url.as_str());
                }
                Arc::new(model)
            }
            ModelType::OpenAI | ModelType::Groq => {
                let api_key = Self::api_key(config)?;
                let mut model = if config.model_type == ModelType::Groq {
                    OpenAIModel::groq(config.model_id.clone(), api_key)
                } else {
                    OpenAIModel::with_api_key(config.model_id.clone(), api_key)
                }
                .with_client(Self::client(config)?);
                if let Some(base_url) = &config.base_url {
                    model = model.with_base_url(base_url.as_str());
                }
                Arc::new(model)
            }
        };

        if config.max_retries > 1 {
            Ok(Arc::new(RetryModel::new(model).with_max_retries(config.max_retries)))
        } else {
            Ok(model)
        }
    }

    /// Creates a model whose provider is detected from the model ID.
    ///
    /// # Errors
    /// Returns a `ModelError` if the provider is unknown or creation fails.
    pub fn create_from_id(model_id: &str, api_key: Option<String>) -> Result<Arc<dyn Model>, ModelError> {
        let mut config = ModelConfig::detect(model_id)?;
        config.api_key = api_key;
        Self::create(&config)
    }

    fn api_key(config: &ModelConfig) -> Result<String, ModelError> {
        config.api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
            error!(provider = %config.model_type, "Missing API key");
            ModelError::UnsupportedModelProvider(format!(
                "API key for provider '{}' not set",
                config.model_type
            ))
        })
    }

    fn client(config: &ModelConfig) -> Result<Client, ModelError> {
        Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::RequestError(format!("Failed to build HTTP client: {}", e)))
    }
}
