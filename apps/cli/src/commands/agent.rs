//! One-shot tool-use agent run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use rover_orchestrator::{Agent, AgentConfig, ToolRegistry};
use tracing::info;

use super::build_model;
use crate::config::RoverConfig;

/// Default cap on generation calls per run.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// Execute the agent command.
pub async fn execute(
    config: &RoverConfig,
    request: &str,
    workspace: PathBuf,
    model: Option<String>,
    max_turns: usize,
) -> Result<()> {
    let workspace = workspace
        .canonicalize()
        .with_context(|| format!("Workspace not found: {}", workspace.display()))?;
    let model_id = model.unwrap_or_else(|| config.orchestrator_model.clone());
    let model = build_model(config, &model_id)?;

    let tools = Arc::new(ToolRegistry::with_builtin_tools(workspace.clone()));
    info!(
        model_id = %model_id,
        workspace = %workspace.display(),
        tools = ?tools.names(),
        "Starting agent"
    );

    let agent = Agent::new(model, tools).with_config(AgentConfig {
        max_turns: Some(max_turns),
        ..AgentConfig::default()
    });

    let outcome = agent.run(request).await?;

    println!("{}", outcome.final_answer);
    println!();
    println!(
        "{}",
        format!(
            "{} generation call(s), {} tool call(s)",
            outcome.generation_calls, outcome.tool_calls
        )
        .dimmed()
    );
    Ok(())
}
