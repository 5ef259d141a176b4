//! Per-app VPN proxy control through the Anthroid companion app.
//!
//! The companion app only listens for broadcast intents, so a call is
//! fire-and-poll: clear the result file, send the broadcast, then wait for the
//! app to write its answer to the same well-known path. There is no
//! acknowledgment; a missing answer ends in [`AnthroidError::BridgeTimeout`].

use anthroid_config::BridgeConfig;
use anthroid_core::{AnthroidError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::runner::{CommandRunner, escape_double_quoted};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProxyType {
    Socks5,
    Http,
}

impl ProxyType {
    /// Case-insensitive parse of "SOCKS5" / "HTTP".
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SOCKS5" => Ok(ProxyType::Socks5),
            "HTTP" => Ok(ProxyType::Http),
            other => Err(AnthroidError::InvalidArgument {
                name: "proxy_type".into(),
                reason: format!("'{other}' is not one of SOCKS5, HTTP"),
            }),
        }
    }
}

/// Arguments of `set_app_proxy`, forwarded to the companion app as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// Packages routed through the proxy. Empty = the app's saved list.
    pub apps: Vec<String>,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub proxy_type: ProxyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_pass: Option<String>,
}

impl Default for ProxyRequest {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            proxy_host: "localhost".into(),
            proxy_port: 1091,
            proxy_type: ProxyType::Socks5,
            proxy_user: None,
            proxy_pass: None,
        }
    }
}

/// Broadcast + result-file channel to the companion app.
pub struct ProxyBridge {
    runner: Arc<dyn CommandRunner>,
    config: BridgeConfig,
    /// Held for a whole call: the result file is a single shared slot.
    in_flight: Mutex<()>,
}

impl ProxyBridge {
    pub fn new(runner: Arc<dyn CommandRunner>, config: BridgeConfig) -> Self {
        Self {
            runner,
            config,
            in_flight: Mutex::new(()),
        }
    }

    pub async fn set_app_proxy(&self, request: &ProxyRequest) -> Result<String> {
        let input = serde_json::to_value(request)?;
        self.call("set_app_proxy", &input).await
    }

    pub async fn stop_app_proxy(&self) -> Result<String> {
        self.call("stop_app_proxy", &json!({})).await
    }

    pub async fn get_proxy_status(&self) -> Result<String> {
        self.call("get_proxy_status", &json!({})).await
    }

    /// Send one tool call to the companion app and wait for its answer.
    pub async fn call(&self, tool: &str, input: &Value) -> Result<String> {
        let _guard = self.in_flight.lock().await;
        let result_file = &self.config.result_file;

        match tokio::fs::remove_file(result_file).await {
            Ok(()) => debug!(?result_file, "removed stale result file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(?result_file, error = %e, "could not remove stale result file"),
        }

        let request_id = uuid::Uuid::new_v4();
        let command = self.broadcast_command(tool, input, &request_id.to_string())?;
        info!(tool, %request_id, "sending broadcast to companion app");
        let output = self.runner.run_shell(&command).await?;
        debug!(output = %output.trim(), "broadcast sent");

        let interval = Duration::from_millis(self.config.poll_interval_ms);
        for _ in 0..self.config.poll_attempts {
            tokio::time::sleep(interval).await;
            match tokio::fs::read_to_string(result_file).await {
                Ok(result) => {
                    debug!(tool, bytes = result.len(), "companion app answered");
                    return Ok(result);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                // Partially written or briefly locked; try again next tick
                Err(e) => debug!(error = %e, "result file not readable yet"),
            }
        }

        warn!(
            tool,
            attempts = self.config.poll_attempts,
            "companion app did not write a result"
        );
        Err(AnthroidError::BridgeTimeout)
    }

    /// `am broadcast` command line carrying the tool name and JSON input.
    pub fn broadcast_command(&self, tool: &str, input: &Value, request_id: &str) -> Result<String> {
        let input_json = escape_double_quoted(&serde_json::to_string(input)?);
        Ok(format!(
            "am broadcast -a {} --es tool \"{}\" --es input \"{}\" --es request_id \"{}\" -p {}",
            self.config.action,
            escape_double_quoted(tool),
            input_json,
            request_id,
            self.config.package,
        ))
    }
}
