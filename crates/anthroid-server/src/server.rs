use anthroid_config::ServerConfig;
use anthroid_core::{Result, ToolExecutor, ToolResult};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND};

/// Line-oriented MCP server dispatching `tools/*` calls to a [`ToolExecutor`].
pub struct McpServer {
    executor: Arc<dyn ToolExecutor>,
    config: ServerConfig,
}

impl McpServer {
    pub fn new(executor: Arc<dyn ToolExecutor>, config: ServerConfig) -> Self {
        Self { executor, config }
    }

    /// Answer one request. Notifications yield `None`.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "notification received");
            return None;
        }

        let id = request.id;
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(id, self.initialize_result()),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => {
                JsonRpcResponse::success(id, json!({ "tools": self.executor.tools() }))
            }
            "tools/call" => {
                let name = request.params["name"].as_str().unwrap_or_default();
                let arguments = match request.params.get("arguments") {
                    Some(args @ Value::Object(_)) => args.clone(),
                    _ => json!({}),
                };
                let result = self.executor.execute(name, &arguments).await;
                JsonRpcResponse::success(id, call_result(&result))
            }
            other => JsonRpcResponse::failure(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {other}"),
            ),
        };
        Some(response)
    }

    /// Parse and answer one input line. Blank and malformed lines yield `None`.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!(error = %e, "skipping malformed request line");
                None
            }
        }
    }

    /// Serve until `reader` reaches EOF.
    ///
    /// Only a failure to write a response ends the loop early.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(
            server = %self.config.name,
            tools = self.executor.tools().len(),
            "MCP server listening on stdio"
        );

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };

            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            writer.write_all(out.as_bytes()).await?;
            writer.flush().await?;
        }

        info!("input closed, shutting down");
        Ok(())
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": self.config.protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.config.name,
                "version": self.config.version,
            }
        })
    }
}

/// MCP `tools/call` result body. `isError` only appears on failures.
fn call_result(result: &ToolResult) -> Value {
    let mut body = json!({
        "content": [{ "type": "text", "text": result.content }]
    });
    if result.is_error {
        body["isError"] = json!(true);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_result_shapes() {
        assert_eq!(
            call_result(&ToolResult::text("ok")),
            json!({"content": [{"type": "text", "text": "ok"}]})
        );
        assert_eq!(
            call_result(&ToolResult::error("boom")),
            json!({"content": [{"type": "text", "text": "Error: boom"}], "isError": true})
        );
    }
}
