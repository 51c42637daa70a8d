//! Tool registry for the agent loop
//!
//! A registry is assembled once through [`ToolRegistryBuilder`] and is
//! read-only afterwards, so a single `Arc<ToolRegistry>` can back any number
//! of concurrent agent runs.

use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::file_tools::create_file_tools;
use crate::terminal_tool::create_terminal_tool;
use crate::tool::{Tool, ToolArguments};

/// Read-only mapping from tool name to tool
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Tool>,
    /// Name to position in `tools`
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Start building a registry
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Registry with `read_file`, `write_file` and `run_bash`, rooted at `workspace_root`
    pub fn with_builtin_tools(workspace_root: impl Into<PathBuf>) -> Self {
        let workspace_root = workspace_root.into();
        Self::builder()
            .register_all(create_file_tools(&workspace_root))
            .register(create_terminal_tool(&workspace_root))
            .build()
    }

    /// Find a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// One line per tool, for inclusion in prompts
    pub fn describe(&self) -> String {
        self.tools.iter().map(Tool::describe).collect::<Vec<_>>().join("\n")
    }

    /// Invoke `name` with `parameters`
    ///
    /// Returns `None` when no such tool exists. Otherwise always returns the
    /// text to feed back to the model: handler errors are rendered as
    /// `Error: <message>` rather than propagated.
    pub async fn invoke(&self, name: &str, parameters: Map<String, Value>) -> Option<String> {
        let tool = self.get(name)?;
        debug!(tool = %name, "Invoking tool");

        let output = match tool.execute(&ToolArguments::new(parameters)).await {
            Ok(result) => {
                debug!(tool = %name, success = result.success, "Tool finished");
                result.output
            }
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool could not run");
                format!("Error: {}", e)
            }
        };
        Some(output)
    }
}

/// Builder for [`ToolRegistry`]
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Tool>,
}

impl ToolRegistryBuilder {
    /// Add a tool; a later tool with the same name replaces an earlier one
    #[must_use]
    pub fn register(mut self, tool: Tool) -> Self {
        self.tools.retain(|t| t.name != tool.name);
        self.tools.push(tool);
        self
    }

    /// Add several tools
    #[must_use]
    pub fn register_all(self, tools: impl IntoIterator<Item = Tool>) -> Self {
        tools.into_iter().fold(self, Self::register)
    }

    /// Freeze the registry
    pub fn build(self) -> ToolRegistry {
        let index = self.tools.iter().enumerate().map(|(i, t)| (t.name.clone(), i)).collect();
        ToolRegistry { tools: self.tools, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OrchestrationError, Result};
    use crate::tool::{ToolHandler, ToolParameters, ToolResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
            Ok(ToolResult::success(args.require_string("echo", "text")?))
        }
    }

    struct Broken;

    #[async_trait]
    impl ToolHandler for Broken {
        async fn execute(&self, _args: &ToolArguments) -> Result<ToolResult> {
            Err(OrchestrationError::Other("disk on fire".to_string()))
        }
    }

    fn tool(name: &str, handler: Arc<dyn ToolHandler>) -> Tool {
        Tool::new(
            name,
            "Test tool",
            ToolParameters::new().add_property("text", "string", "Text", true),
            handler,
        )
    }

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builder_registers_in_order() {
        let registry = ToolRegistry::builder()
            .register(tool("echo", Arc::new(Echo)))
            .register(tool("broken", Arc::new(Broken)))
            .build();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["echo", "broken"]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(
            registry.describe(),
            "- echo(text: str): Test tool\n- broken(text: str): Test tool"
        );
    }

    #[test]
    fn test_duplicate_name_replaces() {
        let registry = ToolRegistry::builder()
            .register(tool("echo", Arc::new(Broken)))
            .register(tool("echo", Arc::new(Echo)))
            .build();
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_invoke_is_total() {
        let registry = ToolRegistry::builder()
            .register(tool("echo", Arc::new(Echo)))
            .register(tool("broken", Arc::new(Broken)))
            .build();

        let out = registry.invoke("echo", params(serde_json::json!({"text": "hi"}))).await;
        assert_eq!(out.as_deref(), Some("hi"));

        let out = registry.invoke("broken", Map::new()).await;
        assert_eq!(out.as_deref(), Some("Error: Orchestration error: disk on fire"));

        let out = registry.invoke("echo", Map::new()).await;
        assert_eq!(
            out.as_deref(),
            Some("Error: Invalid tool arguments for 'echo': Missing required 'text' argument")
        );

        assert_eq!(registry.invoke("missing", Map::new()).await, None);
    }

    #[test]
    fn test_builtin_tools() {
        let registry = ToolRegistry::with_builtin_tools(std::env::temp_dir());
        assert_eq!(registry.names(), vec!["read_file", "write_file", "run_bash"]);
    }
}
