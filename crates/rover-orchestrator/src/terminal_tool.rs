//! Shell command tool
//!
//! `run_bash` runs a command through the platform shell in the workspace
//! root. A non-zero exit status is not a failure: the captured output is
//! returned either way and the model decides what to do with it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::info;

use crate::error::Result;
use crate::tool::{Tool, ToolArguments, ToolHandler, ToolParameters, ToolResult};

/// Default timeout for commands (in seconds)
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 120;

/// Terminal command tool handler
struct TerminalCommandHandler {
    /// Working directory for every command
    workspace_root: PathBuf,
    /// Timeout per command
    timeout: Duration,
}

#[async_trait]
impl ToolHandler for TerminalCommandHandler {
    async fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        let command = args.require_string("run_bash", "command")?;
        info!(command = %command, cwd = %self.workspace_root.display(), "Running command");
        Ok(self.execute_command(&command).await)
    }
}

impl TerminalCommandHandler {
    async fn execute_command(&self, command: &str) -> ToolResult {
        #[cfg(unix)]
        let (shell_cmd, shell_arg) = ("sh", "-c");
        #[cfg(windows)]
        let (shell_cmd, shell_arg) = ("cmd", "/c");

        let mut cmd = Command::new(shell_cmd);
        cmd.arg(shell_arg).arg(command).current_dir(&self.workspace_root).kill_on_drop(true);

        match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);

                let mut text = format!("STDOUT:\n{}\n", stdout);
                if !stderr.is_empty() {
                    text.push_str(&format!("STDERR:\n{}\n", stderr));
                }
                ToolResult::success(text)
            }
            Ok(Err(e)) => ToolResult::error(format!("Error running command: {}", e)),
            Err(_) => ToolResult::error(format!(
                "Error running command: timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }
}

/// Create the `run_bash` tool with the default timeout
pub fn create_terminal_tool(workspace_root: &Path) -> Tool {
    create_terminal_tool_with_timeout(workspace_root, Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS))
}

/// Create the `run_bash` tool with a custom per-command timeout
pub fn create_terminal_tool_with_timeout(workspace_root: &Path, timeout: Duration) -> Tool {
    Tool::new(
        "run_bash",
        "Execute a bash command in the terminal.",
        ToolParameters::new().add_property("command", "string", "Shell command to run", true),
        Arc::new(TerminalCommandHandler { workspace_root: workspace_root.to_path_buf(), timeout }),
    )
}
