//! Conversational tool-use agent.
//!
//! The agent sends its whole history to the model, looks for a single
//! `<tool_code>{...}</tool_code>` block in the reply, runs the named tool and
//! feeds the output back as `<tool_result>`. A reply without a well-formed
//! block is the final answer.

use std::sync::Arc;

use rover_abstraction::{ChatMessage, Model, ModelParameters};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::error::{OrchestrationError, Result};
use crate::prompts::{TOOL_CALL_CLOSE, TOOL_CALL_OPEN, agent_instructions};
use crate::tool_registry::ToolRegistry;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The user, the instruction turn, or tool output.
    User,
    /// The model.
    Assistant,
}

/// One entry of the agent history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Producer of the turn.
    pub role: TurnRole,
    /// Free text, possibly embedding a tool call.
    pub content: String,
}

/// Ordered, append-only history of one agent run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
}

impl Conversation {
    /// Appends a user-side turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn { role: TurnRole::User, content: content.into() });
    }

    /// Appends a model turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(ConversationTurn { role: TurnRole::Assistant, content: content.into() });
    }

    /// All turns in order.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent turn.
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    fn to_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|turn| match turn.role {
                TurnRole::User => ChatMessage::user(turn.content.as_str()),
                TurnRole::Assistant => ChatMessage::assistant(turn.content.as_str()),
            })
            .collect()
    }
}

/// A tool call parsed out of a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolCallRequest {
    /// Registry name of the tool.
    pub tool_name: String,
    /// Arguments; `{}` when the reply omits them.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Extracts a tool call from `text`.
///
/// The payload is the text between the first opening marker and the first
/// closing marker after it. Anything malformed yields `None`.
pub fn parse_tool_call(text: &str) -> Option<ToolCallRequest> {
    let (_, rest) = text.split_once(TOOL_CALL_OPEN)?;
    let (payload, _) = rest.split_once(TOOL_CALL_CLOSE)?;

    match serde_json::from_str(payload) {
        Ok(call) => Some(call),
        Err(e) => {
            debug!(error = %e, "Ignoring malformed tool call");
            None
        }
    }
}

/// Wraps tool output for the next user turn.
pub fn tool_result_turn(output: &str) -> String {
    format!("<tool_result>\n{}\n</tool_result>", output)
}

/// Turn sent back when the model names a tool that does not exist.
pub fn unknown_tool_turn(name: &str) -> String {
    format!("Tool '{}' not found.", name)
}

/// Configuration for [`Agent`].
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    /// Sampling temperature for every generation call.
    pub temperature: f32,
    /// Token budget per generation call.
    pub max_tokens: u32,
    /// Cap on generation calls per run; `None` or `Some(0)` runs until the
    /// model stops.
    pub max_turns: Option<usize>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 2000, max_turns: Some(25) }
    }
}

/// Result of a completed agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentOutcome {
    /// The reply that contained no tool call, verbatim.
    pub final_answer: String,
    /// Full history, instruction turn included.
    pub history: Conversation,
    /// Number of model calls made.
    pub generation_calls: usize,
    /// Number of tool calls parsed, known or not.
    pub tool_calls: usize,
}

/// Drives a model through tool calls until it gives a final answer.
///
/// Each [`Agent::run`] owns a fresh history; the registry is shared.
pub struct Agent {
    model: Arc<dyn Model>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
    instructions: String,
}

impl Agent {
    /// Creates an agent with the default configuration.
    pub fn new(model: Arc<dyn Model>, tools: Arc<ToolRegistry>) -> Self {
        let instructions = agent_instructions(&tools);
        Self { model, tools, config: AgentConfig::default(), instructions }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the instruction turn.
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    /// Agent configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Runs one conversation for `request`.
    ///
    /// # Errors
    /// `OrchestrationError::Model` when a generation call fails, and
    /// `OrchestrationError::MaxIterations` when the model is still calling
    /// tools after `max_turns` generations.
    pub async fn run(&self, request: &str) -> Result<AgentOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("agent_run", run_id = %run_id, model_id = %self.model.model_id());
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &str) -> Result<AgentOutcome> {
        let mut history = Conversation::default();
        history.push_user(self.instructions.as_str());
        history.push_user(request);

        let params = ModelParameters::new(self.config.temperature, self.config.max_tokens);
        let mut generation_calls = 0;
        let mut tool_calls = 0;

        loop {
            if let Some(max_turns) = self.config.max_turns.filter(|&n| n > 0) {
                if generation_calls >= max_turns {
                    warn!(max_turns, tool_calls, "Agent reached maximum turns");
                    return Err(OrchestrationError::MaxIterations(max_turns));
                }
            }

            let response = self
                .model
                .generate_chat_completion(&history.to_messages(), Some(params.clone()))
                .await?;
            generation_calls += 1;
            let reply = response.content;
            history.push_assistant(reply.as_str());

            let Some(call) = parse_tool_call(&reply) else {
                info!(generation_calls, tool_calls, "Agent finished");
                return Ok(AgentOutcome { final_answer: reply, history, generation_calls, tool_calls });
            };

            tool_calls += 1;
            info!(tool = %call.tool_name, "Tool call requested");

            let feedback = match self.tools.invoke(&call.tool_name, call.parameters).await {
                Some(output) => tool_result_turn(&output),
                None => {
                    warn!(tool = %call.tool_name, "Unknown tool requested");
                    unknown_tool_turn(&call.tool_name)
                }
            };
            history.push_user(feedback);
        }
    }
}
