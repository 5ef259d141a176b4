#[cfg(test)]
mod tests {
    use anthroid_config::{AnthroidConfig, ServerConfig};
    use anthroid_core::{Tool, ToolExecutor, ToolResult};
    use anthroid_device::DeviceTools;
    use anthroid_device::mock::MockRunner;
    use anthroid_server::McpServer;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// Echoes calls back and records them.
    #[derive(Default)]
    struct EchoExecutor {
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        fn tools(&self) -> Vec<Tool> {
            vec![Tool {
                name: "echo".into(),
                description: "Echo the input".into(),
                input_schema: json!({"type": "object", "properties": {}}),
            }]
        }

        async fn execute(&self, name: &str, arguments: &Value) -> ToolResult {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments.clone()));
            match arguments.get("fail") {
                Some(_) => ToolResult::error("asked to fail"),
                None => ToolResult::text(format!("{name}: {arguments}")),
            }
        }
    }

    fn device_server(runner: MockRunner) -> McpServer {
        let tools = DeviceTools::new(Arc::new(runner), &AnthroidConfig::default());
        McpServer::new(Arc::new(tools), ServerConfig::default())
    }

    /// Feed `input` through the loop and parse every output line.
    async fn run(server: &McpServer, input: &str) -> Vec<Value> {
        let mut out = Vec::new();
        server.serve(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    // ── Lifecycle ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_initialize() {
        let server = device_server(MockRunner::new());
        let out = run(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#,
        )
        .await;

        assert_eq!(
            out,
            vec![json!({
                "jsonrpc": "2.0",
                "id": 1,
                "result": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "android-tools", "version": "1.0.0"}
                }
            })]
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = device_server(MockRunner::new());
        let out = run(
            &server,
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
             {\"jsonrpc\":\"2.0\",\"method\":\"notifications/cancelled\",\"params\":{\"requestId\":3}}\n",
        )
        .await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = device_server(MockRunner::new());
        let out = run(&server, r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(out[0]["id"], "p");
        assert_eq!(out[0]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = device_server(MockRunner::new());
        let out = run(&server, r#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#).await;
        assert_eq!(out[0]["error"]["code"], -32601);
        assert_eq!(out[0]["error"]["message"], "Unknown method: resources/list");
        assert!(out[0].get("result").is_none());
    }

    #[tokio::test]
    async fn test_missing_id_answers_null() {
        let server = device_server(MockRunner::new());
        let out = run(&server, r#"{"jsonrpc":"2.0","method":"ping"}"#).await;
        assert_eq!(out[0]["id"], Value::Null);
    }

    // ── Tools ──────────────────────────────────────────────────

    #[tokio::test]
    async fn test_tools_list() {
        let server = device_server(MockRunner::new());
        let out = run(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;

        let names: Vec<&str> = out[0]["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            [
                "show_notification",
                "open_url",
                "launch_app",
                "list_apps",
                "get_location",
                "query_calendar",
                "set_app_proxy",
                "stop_app_proxy",
                "get_proxy_status",
            ]
        );
        assert_eq!(out[0]["result"]["tools"][1]["inputSchema"]["required"], json!(["url"]));
    }

    #[tokio::test]
    async fn test_tools_call_list_apps() {
        let runner = MockRunner::new().with_stdout(
            "pm list packages -3",
            "package:com.example.one\npackage:com.example.two\npackage:com.example.three\n",
        );
        let server = device_server(runner);
        let out = run(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"list_apps","arguments":{"limit":2}}}"#,
        )
        .await;

        let result = &out[0]["result"];
        assert!(result.get("isError").is_none());
        assert_eq!(result["content"][0]["type"], "text");
        let apps: Vec<String> =
            serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(apps, ["com.example.one", "com.example.two"]);
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool() {
        let server = device_server(MockRunner::new());
        let out = run(
            &server,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"format_sdcard","arguments":{}}}"#,
        )
        .await;

        assert_eq!(
            out[0]["result"],
            json!({"content": [{"type": "text", "text": "Unknown tool: format_sdcard"}]})
        );
    }

    #[tokio::test]
    async fn test_tools_call_error_sets_is_error() {
        let server = device_server(MockRunner::new());
        let out = run(
            &server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"open_url","arguments":{}}}"#,
        )
        .await;

        assert_eq!(out[0]["result"]["isError"], true);
        assert_eq!(
            out[0]["result"]["content"][0]["text"],
            "Error: missing required argument 'url'"
        );
    }

    #[tokio::test]
    async fn test_tools_call_defaults_missing_arguments() {
        let executor = Arc::new(EchoExecutor::default());
        let server = McpServer::new(executor.clone(), ServerConfig::default());
        run(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"tools/call\",\"params\":{\"name\":\"echo\"}}\n\
             {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/call\",\"params\":{\"name\":\"echo\",\"arguments\":null}}\n",
        )
        .await;

        let calls = executor.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|(name, args)| name == "echo" && *args == json!({})));
    }

    // ── Stream handling ────────────────────────────────────────

    #[tokio::test]
    async fn test_malformed_line_does_not_stop_loop() {
        let executor = Arc::new(EchoExecutor::default());
        let server = McpServer::new(executor, ServerConfig::default());
        let out = run(
            &server,
            "this is not json\n\
             {\"id\":9}\n\
             \n\
             {\"jsonrpc\":\"2.0\",\"id\":10,\"method\":\"ping\"}\n",
        )
        .await;

        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["id"], 10);
    }

    #[tokio::test]
    async fn test_responses_in_request_order() {
        let executor = Arc::new(EchoExecutor::default());
        let server = McpServer::new(executor, ServerConfig::default());
        let out = run(
            &server,
            "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\"}\n\
             {\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n\
             {\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n\
             {\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\",\"params\":{\"name\":\"echo\",\"arguments\":{\"fail\":1}}}",
        )
        .await;

        let ids: Vec<i64> = out.iter().map(|r| r["id"].as_i64().unwrap()).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(out[2]["result"]["isError"], true);
    }

    #[tokio::test]
    async fn test_empty_input_ends_cleanly() {
        let server = device_server(MockRunner::new());
        assert!(run(&server, "").await.is_empty());
    }
}
