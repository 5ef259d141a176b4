use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use anthroid_config::AnthroidConfig;
use anthroid_device::{InstallClicker, SystemRunner, UiAutomatorDriver, UiTransport};

pub(super) async fn cmd_click(
    mut config: AnthroidConfig,
    timeout: Option<u64>,
    local: bool,
    serial: Option<String>,
) -> anthroid_core::Result<()> {
    if local {
        config.clicker.transport = "local".into();
    } else if let Some(serial) = serial {
        config.clicker.transport = "adb".into();
        config.clicker.adb_serial = Some(serial);
    }
    let timeout = Duration::from_secs(timeout.unwrap_or(config.clicker.timeout_secs));

    let runner = Arc::new(SystemRunner::new(&config.commands));
    let driver = UiAutomatorDriver::new(
        runner,
        UiTransport::from_config(&config.clicker),
        config.clicker.dump_path.clone(),
    );
    let clicker = InstallClicker::new(Arc::new(driver), &config.clicker);

    info!(
        transport = %config.clicker.transport,
        serial = config.clicker.adb_serial.as_deref().unwrap_or("default"),
        max_clicks = config.clicker.max_clicks,
        "starting install clicker"
    );
    let report = clicker.watch(timeout).await;
    println!("Total clicks: {}", report.clicks);
    Ok(())
}
