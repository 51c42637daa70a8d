//! File operation tools
//!
//! `read_file` and `write_file`, resolving relative paths against the
//! workspace root. I/O failures are reported in the tool output so the
//! model can react to them.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::info;

use crate::error::Result;
use crate::tool::{Tool, ToolArguments, ToolHandler, ToolParameters, ToolResult};

/// File operation tool handler
struct FileOperationHandler {
    /// Directory relative paths resolve against
    workspace_root: PathBuf,
    /// Operation type
    operation: FileOperation,
}

/// File operation types
#[derive(Debug, Clone, Copy)]
enum FileOperation {
    ReadFile,
    WriteFile,
}

#[async_trait]
impl ToolHandler for FileOperationHandler {
    async fn execute(&self, args: &ToolArguments) -> Result<ToolResult> {
        match self.operation {
            FileOperation::ReadFile => self.handle_read_file(args).await,
            FileOperation::WriteFile => self.handle_write_file(args).await,
        }
    }
}

impl FileOperationHandler {
    /// Resolve a file path relative to workspace root
    fn resolve_path(&self, path_str: &str) -> PathBuf {
        let path = Path::new(path_str);
        if path.is_absolute() { path.to_path_buf() } else { self.workspace_root.join(path) }
    }

    /// Handle read_file operation
    async fn handle_read_file(&self, args: &ToolArguments) -> Result<ToolResult> {
        let path = args.require_string("read_file", "path")?;
        let resolved_path = self.resolve_path(&path);
        info!(path = %resolved_path.display(), "Reading file");

        match fs::read_to_string(&resolved_path).await {
            Ok(content) => Ok(ToolResult::success(content)),
            Err(e) => Ok(ToolResult::error(format!("Error reading file: {}", e))),
        }
    }

    /// Handle write_file operation
    async fn handle_write_file(&self, args: &ToolArguments) -> Result<ToolResult> {
        let path = args.require_string("write_file", "path")?;
        let content = args.require_string("write_file", "content")?;
        let resolved_path = self.resolve_path(&path);
        info!(path = %resolved_path.display(), bytes = content.len(), "Writing file");

        if let Some(parent) = resolved_path.parent() {
            if let Err(e) = fs::create_dir_all(parent).await {
                return Ok(ToolResult::error(format!("Error writing file: {}", e)));
            }
        }

        match fs::write(&resolved_path, content).await {
            Ok(()) => Ok(ToolResult::success(format!("Successfully wrote to {}", path))),
            Err(e) => Ok(ToolResult::error(format!("Error writing file: {}", e))),
        }
    }
}

/// Create the file operation tools rooted at `workspace_root`
pub fn create_file_tools(workspace_root: &Path) -> Vec<Tool> {
    let handler = |operation| {
        Arc::new(FileOperationHandler { workspace_root: workspace_root.to_path_buf(), operation })
    };

    vec![
        Tool::new(
            "read_file",
            "Read the contents of a file.",
            ToolParameters::new().add_property("path", "string", "Path of the file to read", true),
            handler(FileOperation::ReadFile),
        ),
        Tool::new(
            "write_file",
            "Write or overwrite content in a file.",
            ToolParameters::new()
                .add_property("path", "string", "Path of the file to write", true)
                .add_property("content", "string", "Full new content of the file", true),
            handler(FileOperation::WriteFile),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    fn args(value: Value) -> ToolArguments {
        ToolArguments::new(value.as_object().cloned().unwrap())
    }

    fn tool<'a>(tools: &'a [Tool], name: &str) -> &'a Tool {
        tools.iter().find(|t| t.name == name).unwrap()
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let tools = create_file_tools(temp_dir.path());

        let result = tool(&tools, "write_file")
            .execute(&args(json!({"path": "src/nested/hello.py", "content": "print('hi')\n"})))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "Successfully wrote to src/nested/hello.py");
        assert!(temp_dir.path().join("src/nested/hello.py").exists());

        let result =
            tool(&tools, "read_file").execute(&args(json!({"path": "src/nested/hello.py"}))).await.unwrap();
        assert!(result.success);
        assert_eq!(result.output, "print('hi')\n");
    }

    #[tokio::test]
    async fn test_read_missing_file_reports_error() {
        let temp_dir = TempDir::new().unwrap();
        let tools = create_file_tools(temp_dir.path());

        let result =
            tool(&tools, "read_file").execute(&args(json!({"path": "nope.txt"}))).await.unwrap();
        assert!(!result.success);
        assert!(result.output.starts_with("Error reading file: "));
    }

    #[tokio::test]
    async fn test_absolute_path_is_used_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let target = other.path().join("abs.txt");
        let tools = create_file_tools(temp_dir.path());

        let path = target.display().to_string();
        tool(&tools, "write_file")
            .execute(&args(json!({"path": path, "content": "x"})))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "x");
    }

    #[tokio::test]
    async fn test_missing_argument_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let tools = create_file_tools(temp_dir.path());

        let err = tool(&tools, "write_file")
            .execute(&args(json!({"path": "a.txt"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Missing required 'content' argument"));
    }
}
