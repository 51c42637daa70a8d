//! Prompt templates shared by the agent and the planner.

use crate::tool_registry::ToolRegistry;

/// Opening marker of a tool call in a model reply.
pub const TOOL_CALL_OPEN: &str = "<tool_code>";

/// Closing marker of a tool call in a model reply.
pub const TOOL_CALL_CLOSE: &str = "</tool_code>";

/// Builds the instruction turn that opens every agent conversation.
///
/// The tool list is rendered from `registry`, so the model is only ever
/// told about tools it can actually call.
pub fn agent_instructions(registry: &ToolRegistry) -> String {
    format!(
        r#"
You are an AI coding assistant with access to tools for interacting with the file system and running code.
Your primary goal is to solve the user's request step by step, maintaining context across multiple turns if needed.

Available tools:
{tools}

Rules for using tools:
1. When invoking a tool, respond ONLY with a JSON object wrapped in {open} XML tags.
   Example:
   {open}
   {{
     "tool_name": "read_file",
     "parameters": {{
       "path": "src/main.py"
     }}
   }}
   {close}

2. Never include explanations, comments, or extra text outside of {open} when calling tools.

3. If a request requires multiple steps (e.g., read → modify → write → run), perform them across multiple turns while remembering prior context.

4. If no tool is needed, reply directly with your answer or explanation in plain text.

5. Always ensure correctness, safety, and clarity in your output.
"#,
        tools = registry.describe(),
        open = TOOL_CALL_OPEN,
        close = TOOL_CALL_CLOSE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instructions_list_builtin_tools() {
        let registry = ToolRegistry::with_builtin_tools(".");
        let text = agent_instructions(&registry);

        assert!(text.contains("- read_file(path: str): Read the contents of a file."));
        assert!(text.contains("- write_file(path: str, content: str): Write or overwrite content in a file."));
        assert!(text.contains("- run_bash(command: str): Execute a bash command in the terminal."));
        assert!(text.contains("\"tool_name\": \"read_file\""));
        assert!(text.contains("<tool_code>"));
    }
}
