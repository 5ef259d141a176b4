use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of a tool advertised to the calling agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Unique name, e.g. "open_url", "list_apps".
    pub name: String,
    /// Human-readable description for the agent.
    pub description: String,
    /// JSON Schema of the arguments object.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The text outcome of a tool call.
///
/// Failures are still results: the agent sees `"Error: ..."` text rather than
/// a protocol-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Render an error the way every tool reports failures.
    pub fn error(err: impl std::fmt::Display) -> Self {
        Self {
            content: format!("Error: {err}"),
            is_error: true,
        }
    }
}

impl From<crate::Result<String>> for ToolResult {
    fn from(res: crate::Result<String>) -> Self {
        match res {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(e),
        }
    }
}

/// Trait implemented by anything that can execute tool calls.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// List all tools this executor provides.
    fn tools(&self) -> Vec<Tool>;

    /// Execute a single tool call. Never fails: errors become error results.
    async fn execute(&self, name: &str, arguments: &Value) -> ToolResult;
}
