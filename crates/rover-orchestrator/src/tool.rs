// Tool abstractions for the agent loop
//
// Tools are the side-effecting operations the agent may request from inside
// a model reply. This module defines the tool interface and parameter
// structures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{OrchestrationError, Result};

/// Tool parameters schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (always "object" for function parameters)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Property definitions
    pub properties: HashMap<String, ToolPropertySchema>,
    /// Required property names, in declaration order
    pub required: Vec<String>,
}

impl ToolParameters {
    /// Create a new tool parameters schema
    pub fn new() -> Self {
        Self { param_type: "object".to_string(), properties: HashMap::new(), required: Vec::new() }
    }

    /// Add a property to the schema
    #[must_use]
    pub fn add_property(
        mut self,
        name: impl Into<String>,
        property_type: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        self.properties.insert(
            name.clone(),
            ToolPropertySchema {
                property_type: property_type.into(),
                description: description.into(),
            },
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Renders the parameters as a call signature, e.g. `path: str, content: str`.
    ///
    /// Required parameters come first in declaration order, optional ones
    /// follow sorted by name.
    pub fn signature(&self) -> String {
        let mut optional: Vec<&String> =
            self.properties.keys().filter(|name| !self.required.contains(name)).collect();
        optional.sort();

        self.required
            .iter()
            .map(|name| self.render(name, false))
            .chain(optional.into_iter().map(|name| self.render(name, true)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render(&self, name: &str, optional: bool) -> String {
        let ty = self.properties.get(name).map_or("any", |p| short_type(&p.property_type));
        if optional { format!("{name}?: {ty}") } else { format!("{name}: {ty}") }
    }
}

/// Python-flavoured type names, matching what the driving model is shown.
fn short_type(json_type: &str) -> &str {
    match json_type {
        "string" => "str",
        "integer" => "int",
        "number" => "float",
        "boolean" => "bool",
        "object" => "dict",
        "array" => "list",
        other => other,
    }
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Tool property schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolPropertySchema {
    /// Property type
    #[serde(rename = "type")]
    pub property_type: String,
    /// Property description
    pub description: String,
}

/// Arguments passed to tool handler
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    /// The `parameters` object from the tool call
    pub args: Map<String, Value>,
}

impl ToolArguments {
    /// Create new tool arguments
    pub fn new(args: Map<String, Value>) -> Self {
        Self { args }
    }

    /// Get argument as string
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.args.get(key)?.as_str().map(str::to_string)
    }

    /// Get a required string argument for `tool`
    pub fn require_string(&self, tool: &str, key: &str) -> Result<String> {
        self.get_string(key).ok_or_else(|| OrchestrationError::InvalidToolArguments {
            tool: tool.to_string(),
            reason: format!("Missing required '{}' argument", key),
        })
    }
}

/// Result from tool execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether execution succeeded
    pub success: bool,
    /// Output fed back to the model, success or not
    pub output: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(output: impl Into<String>) -> Self {
        Self { success: true, output: output.into() }
    }

    /// Create an error result
    pub fn error(output: impl Into<String>) -> Self {
        Self { success: false, output: output.into() }
    }
}

/// Handler for tool execution
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with given arguments
    ///
    /// Failures the model can act on belong in an error `ToolResult`;
    /// an `Err` is reserved for calls that could not be attempted at all.
    async fn execute(&self, args: &ToolArguments) -> Result<ToolResult>;
}

/// Tool definition
#[derive(Clone)]
pub struct Tool {
    /// Tool name (used in tool calls)
    pub name: String,
    /// Tool description
    pub description: String,
    /// Parameter schema
    pub parameters: ToolParameters,
    /// Handler for executing the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Create a new tool
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self { name: name.into(), description: description.into(), parameters, handler }
    }

    /// Execute this tool with given arguments
    pub async fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        self.handler.execute(args).await
    }

    /// One-line listing used in prompts: `- name(signature): description`
    pub fn describe(&self) -> String {
        format!("- {}({}): {}", self.name, self.parameters.signature(), self.description)
    }
}

// Implement Debug manually since Arc<dyn ToolHandler> doesn't implement Debug
impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("handler", &"<handler>")
            .finish()
    }
}
