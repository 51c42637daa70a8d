//! Configuration loading for the `rover` binary.
//!
//! Precedence, lowest to highest:
//! 1. Defaults
//! 2. Global config file (~/.rover/config.toml)
//! 3. Local config file (./.roverrc)
//! 4. File passed with `--config`
//! 5. Environment variables

use rover_models::{ModelConfig, ModelType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default orchestrator (planning) model.
pub const DEFAULT_ORCHESTRATOR_MODEL: &str = "gemini-2.0-flash";
/// Default code-writer model.
pub const DEFAULT_CODEWRITER_MODEL: &str = "openai/gpt-oss-120b";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Explicitly requested file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// File could not be read.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// File is not valid TOML for this schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// An environment override or file value is out of range.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// One or more API keys needed by the configured models are absent.
    #[error("Missing required configuration: {}", .0.join(", "))]
    MissingKeys(Vec<String>),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// One configuration file; every field is optional so layers can merge.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub orchestrator_model: Option<String>,
    pub codewriter_model: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub temperatures: Option<Vec<f32>>,
    pub max_tokens: Option<u32>,
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Loads one TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RoverConfig {
    pub orchestrator_model: String,
    pub codewriter_model: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperatures: Vec<f32>,
    pub max_tokens: u32,
    pub log_level: Option<String>,
}

impl Default for RoverConfig {
    fn default() -> Self {
        Self {
            orchestrator_model: DEFAULT_ORCHESTRATOR_MODEL.to_string(),
            codewriter_model: DEFAULT_CODEWRITER_MODEL.to_string(),
            gemini_api_key: None,
            openai_api_key: None,
            groq_api_key: None,
            timeout_secs: 60,
            max_retries: 3,
            temperatures: vec![0.2, 0.7, 1.0],
            max_tokens: 2000,
            log_level: None,
        }
    }
}

impl RoverConfig {
    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".rover")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".roverrc")
    }

    /// Loads every layer against the process environment.
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Loads every layer, reading environment overrides through `env`.
    ///
    /// Missing global and local files are skipped; a missing `explicit`
    /// file is an error.
    pub fn load_with(
        explicit: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<Self> {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match ConfigFile::load_from_file(&path) {
                Ok(file) => config.merge(&file),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }

        if let Some(path) = explicit {
            config.merge(&ConfigFile::load_from_file(path)?);
        }

        config.apply_env(env)?;
        Ok(config)
    }

    /// Overlays the values set in `file`.
    pub fn merge(&mut self, file: &ConfigFile) {
        if let Some(ref model) = file.orchestrator_model {
            self.orchestrator_model = model.clone();
        }
        if let Some(ref model) = file.codewriter_model {
            self.codewriter_model = model.clone();
        }
        if file.gemini_api_key.is_some() {
            self.gemini_api_key = file.gemini_api_key.clone();
        }
        if file.openai_api_key.is_some() {
            self.openai_api_key = file.openai_api_key.clone();
        }
        if file.groq_api_key.is_some() {
            self.groq_api_key = file.groq_api_key.clone();
        }
        if let Some(timeout) = file.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = file.max_retries {
            self.max_retries = retries;
        }
        if let Some(ref temperatures) = file.temperatures {
            self.temperatures = temperatures.clone();
        }
        if let Some(tokens) = file.max_tokens {
            self.max_tokens = tokens;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level.clone();
        }
    }

    /// Applies environment overrides; empty values are ignored.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(key) = var("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
        if let Some(model) = var("ORCHESTRATOR_MODEL") {
            self.orchestrator_model = model;
        }
        if let Some(model) = var("CODEWRITER_MODEL") {
            self.codewriter_model = model;
        }
        if let Some(value) = var("LLM_TIMEOUT") {
            self.timeout_secs = parse_number("LLM_TIMEOUT", &value)?;
        }
        if let Some(value) = var("LLM_MAX_RETRIES") {
            self.max_retries = parse_number("LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = var("CODE_WRITER_MAX_TOKENS") {
            self.max_tokens = parse_number("CODE_WRITER_MAX_TOKENS", &value)?;
        }
        Ok(())
    }

    /// API key configured for `provider`, if any.
    pub fn api_key(&self, provider: ModelType) -> Option<&str> {
        let key = match provider {
            ModelType::Gemini => self.gemini_api_key.as_deref(),
            ModelType::OpenAI => self.openai_api_key.as_deref(),
            ModelType::Groq => self.groq_api_key.as_deref(),
            ModelType::Mock => None,
        };
        key.filter(|k| !k.trim().is_empty())
    }

    /// Checks that both configured models resolve and have their keys.
    ///
    /// Every problem is reported at once.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.temperatures.is_empty() {
            return Err(ConfigError::InvalidValue("temperatures must not be empty".to_string()));
        }

        let mut missing = Vec::new();
        for model_id in [&self.orchestrator_model, &self.codewriter_model] {
            let provider = ModelType::detect(model_id)
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
            if provider.requires_api_key() && self.api_key(provider).is_none() {
                let key = env_key_name(provider).to_string();
                if !missing.contains(&key) {
                    missing.push(key);
                }
            }
        }

        if missing.is_empty() { Ok(()) } else { Err(ConfigError::MissingKeys(missing)) }
    }

    /// Model configuration for `model_id`, with the provider resolved once.
    pub fn model_config(&self, model_id: &str) -> ConfigResult<ModelConfig> {
        let mut config = ModelConfig::detect(model_id)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?
            .with_timeout_secs(self.timeout_secs)
            .with_max_retries(self.max_retries);
        if let Some(key) = self.api_key(config.model_type) {
            config = config.with_api_key(key.to_string());
        }
        Ok(config)
    }
}

/// Environment variable holding the key for `provider`.
pub const fn env_key_name(provider: ModelType) -> &'static str {
    match provider {
        ModelType::Gemini => "GEMINI_API_KEY",
        ModelType::OpenAI => "OPENAI_API_KEY",
        ModelType::Groq => "GROQ_API_KEY",
        ModelType::Mock => "",
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{}={}", key, value)))
}
