//! Auto-confirm APK install dialogs.
//!
//! Every tick takes one UI snapshot and walks the keyword list in order; the
//! first keyword with a clickable match gets clicked and the tick ends. The
//! next tick starts again from the top of the list.

use anthroid_config::ClickerConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::ui::{UiDriver, UiElement};

/// Outcome of one [`InstallClicker::watch`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickerReport {
    pub clicks: u32,
    /// The run ended on the click cap rather than the timeout.
    pub stopped_by_cap: bool,
}

pub struct InstallClicker {
    driver: Arc<dyn UiDriver>,
    keywords: Vec<String>,
    poll_interval: Duration,
    settle: Duration,
    max_clicks: u32,
}

impl InstallClicker {
    pub fn new(driver: Arc<dyn UiDriver>, config: &ClickerConfig) -> Self {
        Self {
            driver,
            keywords: config.keywords.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            settle: Duration::from_millis(config.settle_ms),
            max_clicks: config.max_clicks,
        }
    }

    /// Poll once and click the highest-priority match. Returns whether a click happened.
    pub async fn click_once(&self) -> bool {
        let elements = match self.driver.elements().await {
            Ok(elements) => elements,
            Err(e) => {
                debug!(error = %e, "ui snapshot failed");
                return false;
            }
        };

        for keyword in &self.keywords {
            let Some(element) = find_match(&elements, keyword) else {
                continue;
            };
            match self.driver.click(element).await {
                Ok(()) => {
                    info!("Clicked: [{keyword}]");
                    tokio::time::sleep(self.settle).await;
                    return true;
                }
                Err(e) => {
                    debug!(keyword = %keyword, error = %e, "click failed, trying next keyword");
                }
            }
        }
        false
    }

    /// Click through dialogs until `timeout` elapses or the click cap is hit.
    pub async fn watch(&self, timeout: Duration) -> ClickerReport {
        match self.driver.device_name().await {
            Ok(name) => info!(device = %name, "connected to device"),
            Err(e) => warn!(error = %e, "could not read device name"),
        }
        info!(timeout_secs = timeout.as_secs(), "watching for install dialogs");

        // Too far out to represent: watch until the click cap
        let deadline = Instant::now().checked_add(timeout);
        let mut report = ClickerReport {
            clicks: 0,
            stopped_by_cap: false,
        };

        while deadline.is_none_or(|d| Instant::now() < d) {
            if self.click_once().await {
                report.clicks += 1;
                if report.clicks >= self.max_clicks {
                    warn!(clicks = report.clicks, "too many clicks, stopping");
                    report.stopped_by_cap = true;
                    break;
                }
                continue;
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        info!("Watch ended. Total clicks: {}", report.clicks);
        report
    }
}

fn find_match<'a>(elements: &'a [UiElement], keyword: &str) -> Option<&'a UiElement> {
    elements.iter().find(|e| e.matches(keyword))
}
