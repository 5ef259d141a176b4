//! UI automation over `uiautomator`.
//!
//! The driver snapshots the view hierarchy with `uiautomator dump`, parses the
//! `<node>` elements out of the XML, and clicks by tapping the centre of an
//! element's bounds with `input tap`. Commands reach the device either through
//! the local shell (when running on the phone) or through `adb shell`.

use anthroid_config::ClickerConfig;
use anthroid_core::{AnthroidError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tracing::debug;

use crate::runner::{CommandRunner, Invocation};

static NODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<node\b([^>]*?)/?>").expect("node pattern is valid"));
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)="([^"]*)""#).expect("attribute pattern is valid"));
static BOUNDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(-?\d+),(-?\d+)\]\[(-?\d+),(-?\d+)\]").expect("bounds pattern is valid")
});

const UI_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// One node of the on-screen view hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiElement {
    pub text: String,
    pub resource_id: String,
    pub class: String,
    pub clickable: bool,
    /// Left, top, right, bottom in screen pixels.
    pub bounds: (i32, i32, i32, i32),
}

impl UiElement {
    pub fn center(&self) -> (i32, i32) {
        let (l, t, r, b) = self.bounds;
        ((l + r) / 2, (t + b) / 2)
    }

    /// A clickable element whose text contains `needle`.
    pub fn matches(&self, needle: &str) -> bool {
        self.clickable && self.text.contains(needle)
    }
}

/// Query-and-click access to the device UI.
#[async_trait]
pub trait UiDriver: Send + Sync {
    /// Product name of the connected device, for logs.
    async fn device_name(&self) -> Result<String>;

    /// Snapshot of the currently visible elements.
    async fn elements(&self) -> Result<Vec<UiElement>>;

    /// Click an element from the latest snapshot.
    async fn click(&self, element: &UiElement) -> Result<()>;
}

/// How UI commands reach the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiTransport {
    /// Running on the device itself.
    Local,
    /// Running on a host with the device attached over adb.
    Adb { serial: Option<String> },
}

impl UiTransport {
    pub fn from_config(config: &ClickerConfig) -> Self {
        match config.transport.as_str() {
            "local" => UiTransport::Local,
            _ => UiTransport::Adb {
                serial: config.adb_serial.clone(),
            },
        }
    }
}

/// [`UiDriver`] backed by `uiautomator dump` and `input tap`.
pub struct UiAutomatorDriver {
    runner: Arc<dyn CommandRunner>,
    transport: UiTransport,
    dump_path: String,
}

impl UiAutomatorDriver {
    pub fn new(runner: Arc<dyn CommandRunner>, transport: UiTransport, dump_path: impl Into<String>) -> Self {
        Self {
            runner,
            transport,
            dump_path: dump_path.into(),
        }
    }

    /// Run a shell command on the device and return stdout + stderr.
    async fn device_shell(&self, command: &str) -> Result<String> {
        match &self.transport {
            UiTransport::Local => self.runner.run_shell(command).await,
            UiTransport::Adb { serial } => {
                let mut invocation = Invocation::new("adb", UI_COMMAND_TIMEOUT);
                if let Some(serial) = serial {
                    invocation = invocation.args(["-s", serial.as_str()]);
                }
                let output = self
                    .runner
                    .exec(&invocation.args(["shell", command]))
                    .await?;
                if output.success() {
                    Ok(output.combined())
                } else {
                    Err(AnthroidError::UiAutomation(format!(
                        "adb shell failed: {}",
                        output.stderr.trim()
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl UiDriver for UiAutomatorDriver {
    async fn device_name(&self) -> Result<String> {
        let name = self.device_shell("getprop ro.product.name").await?;
        let name = name.trim();
        Ok(if name.is_empty() { "unknown".into() } else { name.into() })
    }

    async fn elements(&self) -> Result<Vec<UiElement>> {
        let output = self
            .device_shell(&format!(
                "uiautomator dump {path} >/dev/null && cat {path}",
                path = self.dump_path
            ))
            .await?;
        let start = output.find("<hierarchy").ok_or_else(|| {
            AnthroidError::UiAutomation(format!(
                "no view hierarchy in dump output: {}",
                output.trim()
            ))
        })?;
        let elements = parse_hierarchy(&output[start..]);
        debug!(count = elements.len(), "ui hierarchy parsed");
        Ok(elements)
    }

    async fn click(&self, element: &UiElement) -> Result<()> {
        let (x, y) = element.center();
        self.device_shell(&format!("input tap {x} {y}")).await?;
        Ok(())
    }
}

/// Parse every `<node>` of a `uiautomator dump` document.
pub fn parse_hierarchy(xml: &str) -> Vec<UiElement> {
    NODE_RE
        .captures_iter(xml)
        .map(|node| {
            let mut element = UiElement::default();
            for attr in ATTR_RE.captures_iter(&node[1]) {
                let value = &attr[2];
                match &attr[1] {
                    "text" => element.text = unescape_xml(value),
                    "resource-id" => element.resource_id = value.to_string(),
                    "class" => element.class = value.to_string(),
                    "clickable" => element.clickable = value == "true",
                    "bounds" => {
                        if let Some(b) = parse_bounds(value) {
                            element.bounds = b;
                        }
                    }
                    _ => {}
                }
            }
            element
        })
        .collect()
}

fn parse_bounds(value: &str) -> Option<(i32, i32, i32, i32)> {
    let caps = BOUNDS_RE.captures(value)?;
    Some((
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
        caps[4].parse().ok()?,
    ))
}

fn unescape_xml(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#10;", "\n")
        .replace("&amp;", "&")
}
