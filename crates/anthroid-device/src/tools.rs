//! Device tool definitions and executor.
//!
//! Incoming calls arrive as a name plus an untyped JSON arguments object.
//! [`DeviceCommand::parse`] turns them into a typed command with defaults
//! applied, and [`DeviceTools::run`] matches exhaustively over the commands.

use anthroid_config::AnthroidConfig;
use anthroid_core::{AnthroidError, Result, Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::android::{AndroidBridge, AppFilter};
use crate::proxy::{ProxyBridge, ProxyRequest, ProxyType};
use crate::runner::CommandRunner;

const DEFAULT_TITLE: &str = "Notification";
const DEFAULT_LIST_LIMIT: usize = 50;

/// A tool call with typed, defaulted arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    ShowNotification { title: String, message: String },
    OpenUrl { url: String },
    LaunchApp { package: String },
    ListApps { filter: AppFilter, limit: usize },
    GetLocation,
    QueryCalendar,
    SetAppProxy(ProxyRequest),
    StopAppProxy,
    GetProxyStatus,
}

impl DeviceCommand {
    /// Parse a call by tool name. `Ok(None)` means the name is not a device tool.
    pub fn parse(name: &str, args: &Value) -> Result<Option<Self>> {
        let command = match name {
            "show_notification" => DeviceCommand::ShowNotification {
                title: opt_str(args, "title").unwrap_or(DEFAULT_TITLE).to_string(),
                message: require_str(args, "message")?.to_string(),
            },
            "open_url" => DeviceCommand::OpenUrl {
                url: require_str(args, "url")?.to_string(),
            },
            "launch_app" => DeviceCommand::LaunchApp {
                package: require_str(args, "package")?.to_string(),
            },
            "list_apps" => DeviceCommand::ListApps {
                filter: AppFilter::from_name(opt_str(args, "filter").unwrap_or("user")),
                limit: args["limit"]
                    .as_u64()
                    .map(|n| usize::try_from(n).unwrap_or(usize::MAX))
                    .unwrap_or(DEFAULT_LIST_LIMIT),
            },
            "get_location" => DeviceCommand::GetLocation,
            "query_calendar" => DeviceCommand::QueryCalendar,
            "set_app_proxy" => DeviceCommand::SetAppProxy(parse_proxy_request(args)?),
            "stop_app_proxy" => DeviceCommand::StopAppProxy,
            "get_proxy_status" => DeviceCommand::GetProxyStatus,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::ShowNotification { .. } => "show_notification",
            DeviceCommand::OpenUrl { .. } => "open_url",
            DeviceCommand::LaunchApp { .. } => "launch_app",
            DeviceCommand::ListApps { .. } => "list_apps",
            DeviceCommand::GetLocation => "get_location",
            DeviceCommand::QueryCalendar => "query_calendar",
            DeviceCommand::SetAppProxy(_) => "set_app_proxy",
            DeviceCommand::StopAppProxy => "stop_app_proxy",
            DeviceCommand::GetProxyStatus => "get_proxy_status",
        }
    }
}

fn opt_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    opt_str(args, key).ok_or_else(|| AnthroidError::MissingArgument(key.into()))
}

fn parse_proxy_request(args: &Value) -> Result<ProxyRequest> {
    let defaults = ProxyRequest::default();

    let apps = match args.get("apps") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    };

    let proxy_port = match args.get("proxy_port") {
        None | Some(Value::Null) => defaults.proxy_port,
        Some(v) => v
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| AnthroidError::InvalidArgument {
                name: "proxy_port".into(),
                reason: format!("{v} is not a port number"),
            })?,
    };

    let proxy_type = match opt_str(args, "proxy_type") {
        Some(t) => ProxyType::from_name(t)?,
        None => defaults.proxy_type,
    };

    Ok(ProxyRequest {
        apps,
        proxy_host: opt_str(args, "proxy_host")
            .map(String::from)
            .unwrap_or(defaults.proxy_host),
        proxy_port,
        proxy_type,
        proxy_user: opt_str(args, "proxy_user").map(String::from),
        proxy_pass: opt_str(args, "proxy_pass").map(String::from),
    })
}

/// Holds the device backends and dispatches tool calls.
pub struct DeviceTools {
    android: AndroidBridge,
    proxy: Option<ProxyBridge>,
    tools: Vec<Tool>,
}

impl DeviceTools {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &AnthroidConfig) -> Self {
        let proxy = config
            .bridge
            .enabled
            .then(|| ProxyBridge::new(Arc::clone(&runner), config.bridge.clone()));
        Self {
            android: AndroidBridge::new(runner, config.commands.home_dir()),
            tools: Self::definitions(proxy.is_some()),
            proxy,
        }
    }

    /// Check if a tool name is currently advertised.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Execute a parsed command.
    pub async fn run(&self, command: DeviceCommand) -> Result<String> {
        debug!(command = command.name(), "dispatching");
        match command {
            DeviceCommand::ShowNotification { title, message } => {
                self.android.show_notification(&title, &message).await
            }
            DeviceCommand::OpenUrl { url } => self.android.open_url(&url).await,
            DeviceCommand::LaunchApp { package } => self.android.launch_app(&package).await,
            DeviceCommand::ListApps { filter, limit } => {
                self.android.list_apps(filter, limit).await
            }
            DeviceCommand::GetLocation => self.android.get_location().await,
            DeviceCommand::QueryCalendar => self.android.query_calendar().await,
            DeviceCommand::SetAppProxy(request) => self.proxy()?.set_app_proxy(&request).await,
            DeviceCommand::StopAppProxy => self.proxy()?.stop_app_proxy().await,
            DeviceCommand::GetProxyStatus => self.proxy()?.get_proxy_status().await,
        }
    }

    fn proxy(&self) -> Result<&ProxyBridge> {
        self.proxy
            .as_ref()
            .ok_or_else(|| AnthroidError::Config("companion app bridge is disabled".into()))
    }

    /// Return the tool definitions, with or without the companion app tools.
    pub fn definitions(include_proxy: bool) -> Vec<Tool> {
        let mut tools = vec![
            Tool {
                name: "show_notification".into(),
                description: "Show a notification/toast".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "message": { "type": "string" }
                    },
                    "required": ["message"]
                }),
            },
            Tool {
                name: "open_url".into(),
                description: "Open a URL in browser".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": { "url": { "type": "string" } },
                    "required": ["url"]
                }),
            },
            Tool {
                name: "launch_app".into(),
                description: "Launch an app".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": { "package": { "type": "string" } },
                    "required": ["package"]
                }),
            },
            Tool {
                name: "list_apps".into(),
                description: "List installed apps".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "filter": { "type": "string", "enum": ["user", "system", "all"] },
                        "limit": { "type": "integer" }
                    }
                }),
            },
            Tool {
                name: "get_location".into(),
                description: "Get device location".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            Tool {
                name: "query_calendar".into(),
                description: "Query calendar events".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
        ];

        if include_proxy {
            tools.push(Tool {
                name: "set_app_proxy".into(),
                description: "Set up VPN proxy for specified apps. Routes traffic of specified apps through a proxy server.".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "apps": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Package names of apps to route through proxy (e.g., ['com.browser.app'])"
                        },
                        "proxy_host": { "type": "string", "description": "Proxy server address", "default": "localhost" },
                        "proxy_port": { "type": "integer", "description": "Proxy server port", "default": 1091 },
                        "proxy_type": { "type": "string", "enum": ["SOCKS5", "HTTP"], "description": "Proxy protocol type", "default": "SOCKS5" },
                        "proxy_user": { "type": "string", "description": "Username for an authenticated proxy" },
                        "proxy_pass": { "type": "string", "description": "Password for an authenticated proxy" }
                    },
                    "required": ["apps"]
                }),
            });
            tools.push(Tool {
                name: "stop_app_proxy".into(),
                description: "Stop VPN proxy service".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            });
            tools.push(Tool {
                name: "get_proxy_status".into(),
                description: "Get current VPN proxy status (running state, target apps, proxy server)".into(),
                input_schema: json!({ "type": "object", "properties": {} }),
            });
        }

        tools
    }
}

#[async_trait]
impl ToolExecutor for DeviceTools {
    fn tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    async fn execute(&self, name: &str, arguments: &Value) -> ToolResult {
        info!(tool = name, "calling tool");

        let parsed = if self.has_tool(name) {
            DeviceCommand::parse(name, arguments).transpose()
        } else {
            None
        };
        let command = match parsed {
            Some(Ok(command)) => command,
            Some(Err(e)) => return ToolResult::error(e),
            None => return ToolResult::text(format!("Unknown tool: {name}")),
        };

        let result = ToolResult::from(self.run(command).await);
        debug!(
            tool = name,
            is_error = result.is_error,
            result = %truncate(&result.content, 200),
            "tool finished"
        );
        result
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_tool_names_match_definitions() {
        let all = DeviceTools::definitions(true);
        let names: Vec<&str> = all[6..].iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["set_app_proxy", "stop_app_proxy", "get_proxy_status"]);
    }

    #[test]
    fn test_huge_limit_saturates() {
        let cmd = DeviceCommand::parse("list_apps", &json!({"limit": u64::MAX}))
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            DeviceCommand::ListApps {
                filter: AppFilter::User,
                limit: usize::MAX,
            }
        );
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("安装完成", 2), "安装");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
