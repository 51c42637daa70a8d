//! Code generation and tool-use orchestration for CodeRover.
//!
//! - [`CodeWriter`] samples a model at several temperatures, scores every
//!   candidate and keeps the best, retrying while the output looks truncated.
//! - [`Agent`] runs a conversation in which the model may call tools from a
//!   shared [`ToolRegistry`].
//! - [`Planner`] turns a request into a structured [`Plan`].

pub mod agent;
pub mod error;
pub mod file_tools;
pub mod planner;
pub mod prompts;
pub mod scoring;
pub mod terminal_tool;
pub mod tool;
pub mod tool_registry;
pub mod writer;

pub use agent::{
    Agent, AgentConfig, AgentOutcome, Conversation, ConversationTurn, ToolCallRequest, TurnRole,
    parse_tool_call,
};
pub use error::{OrchestrationError, Result};
pub use planner::{Plan, Planner};
pub use scoring::{Scorer, is_truncated};
pub use tool::{Tool, ToolArguments, ToolHandler, ToolParameters, ToolResult};
pub use tool_registry::{ToolRegistry, ToolRegistryBuilder};
pub use writer::{Candidate, CandidateError, CodeWriter, CodeWriterConfig, SelectionResult};
