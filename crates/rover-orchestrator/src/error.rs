// Error types for orchestration

use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Invalid tool arguments
    #[error("Invalid tool arguments for '{tool}': {reason}")]
    InvalidToolArguments {
        /// Tool name
        tool: String,
        /// Reason why arguments are invalid
        reason: String,
    },

    /// Generation failed inside an agent run
    #[error("Model error: {0}")]
    Model(#[from] rover_abstraction::ModelError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The agent kept requesting tools past its turn cap
    #[error("Maximum tool iterations ({0}) reached")]
    MaxIterations(usize),

    /// Other error
    #[error("Orchestration error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_abstraction::ModelError;

    #[test]
    fn test_model_error_converts() {
        let err: OrchestrationError = ModelError::EmptyResponse("groq".to_string()).into();
        assert!(matches!(err, OrchestrationError::Model(_)));
        assert_eq!(err.to_string(), "Model error: Empty response from groq");
    }

    #[test]
    fn test_max_iterations_display() {
        assert_eq!(
            OrchestrationError::MaxIterations(25).to_string(),
            "Maximum tool iterations (25) reached"
        );
    }
}
