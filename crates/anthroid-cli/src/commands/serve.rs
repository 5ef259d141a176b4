use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use anthroid_config::AnthroidConfig;
use anthroid_device::{DeviceTools, SystemRunner};
use anthroid_server::McpServer;

pub(super) async fn cmd_serve(config: AnthroidConfig) -> anthroid_core::Result<()> {
    let runner = Arc::new(SystemRunner::new(&config.commands));
    let tools = Arc::new(DeviceTools::new(runner, &config));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        bridge = config.bridge.enabled,
        shell = %config.commands.shell,
        "starting anthroid MCP server"
    );
    let server = McpServer::new(tools, config.server);

    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
