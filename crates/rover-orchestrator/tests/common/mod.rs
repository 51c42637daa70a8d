//! Test helpers shared by the orchestrator integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rover_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse};

/// What a scripted model was asked.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Prompt for `generate_text`, empty for chat calls.
    pub prompt: String,
    /// History for chat calls, empty for `generate_text`.
    pub messages: Vec<ChatMessage>,
    /// Parameters passed along.
    pub params: Option<ModelParameters>,
}

/// A model that replays canned replies in order and records every call.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedModel {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = Result<S, ModelError>>,
        S: Into<String>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Replies that all succeed.
    pub fn ok<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok::<S, ModelError>))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next(&self, call: RecordedCall) -> Result<ModelResponse, ModelError> {
        self.calls.lock().unwrap().push(call);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::Other("script exhausted".to_string())))?;
        Ok(ModelResponse { content: reply, model_id: Some("scripted".to_string()), usage: None })
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        self.next(RecordedCall { prompt: prompt.to_string(), messages: Vec::new(), params: parameters })
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        self.next(RecordedCall { prompt: String::new(), messages: messages.to_vec(), params: parameters })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Well-formed, complete code that earns every bonus (score 1.0).
pub const CLEAN_CODE: &str = r#"def divide(a: float, b: float) -> float:
    """Divide a by b, raising on zero."""
    # guard against zero
    try:
        return a / b
    except ZeroDivisionError as exc:
        raise ValueError("b must be non-zero") from exc"#;

/// Complete code with no docstring, annotations, handling or comments (score 0.65).
pub const PLAIN_CODE: &str = "def add(a, b):\n    return a + b\n\n\nresult = add(1, 2)\nprint(result)";

/// Code that stops at a function header.
pub const TRUNCATED_CODE: &str =
    "import os\n\n\ndef helper(x):\n    return os.path.join(x, 'a')\n\n\ndef foo():";
