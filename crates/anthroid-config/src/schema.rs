use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, maps to `anthroid.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthroidConfig {
    pub server: ServerConfig,
    pub commands: CommandsConfig,
    pub bridge: BridgeConfig,
    pub clicker: ClickerConfig,
    pub logging: LoggingConfig,
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in `serverInfo` on `initialize`.
    pub name: String,
    /// Version reported in `serverInfo`.
    pub version: String,
    /// MCP protocol revision answered on `initialize`.
    pub protocol_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "android-tools".into(),
            version: "1.0.0".into(),
            protocol_version: "2024-11-05".into(),
        }
    }
}

// ── Commands ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Shell used to run command strings (`<shell> -c <command>`).
    pub shell: String,
    /// Default timeout for shell commands, in seconds.
    pub timeout_secs: u64,
    /// Home directory for the notification fallback file. None = `$HOME`.
    pub home: Option<PathBuf>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            shell: "sh".into(),
            timeout_secs: 30,
            home: None,
        }
    }
}

impl CommandsConfig {
    /// Resolve the home directory: explicit config > `$HOME` > the Anthroid app home.
    pub fn home_dir(&self) -> PathBuf {
        if let Some(ref home) = self.home {
            return home.clone();
        }
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("/data/data/com.anthroid/files/home"))
    }
}

// ── Companion app bridge ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Advertise the proxy tools. When false only the six direct tools are exposed.
    pub enabled: bool,
    /// Package the broadcast is addressed to.
    pub package: String,
    /// Broadcast intent action.
    pub action: String,
    /// Well-known file the companion app writes its answer to.
    pub result_file: PathBuf,
    /// Delay between result file checks, in milliseconds.
    pub poll_interval_ms: u64,
    /// Number of checks before giving up.
    pub poll_attempts: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            package: "com.anthroid".into(),
            action: "com.anthroid.TOOL_CALL".into(),
            result_file: PathBuf::from("/sdcard/anthroid_tool_result.txt"),
            poll_interval_ms: 100,
            poll_attempts: 30,
        }
    }
}

// ── Install-dialog clicker ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickerConfig {
    /// Button texts to look for, most specific first.
    pub keywords: Vec<String>,
    /// Sleep between polls when nothing matched, in milliseconds.
    pub poll_interval_ms: u64,
    /// Sleep after a click so the UI can react, in milliseconds.
    pub settle_ms: u64,
    /// Stop after this many clicks in one run.
    pub max_clicks: u32,
    /// Watch duration when none is given on the command line, in seconds.
    pub timeout_secs: u64,
    /// "adb" to drive a USB-connected device, "local" when running on the device itself.
    pub transport: String,
    /// Device serial for adb (None = the single connected device).
    pub adb_serial: Option<String>,
    /// Where `uiautomator dump` writes the hierarchy on the device.
    pub dump_path: String,
}

impl Default for ClickerConfig {
    fn default() -> Self {
        Self {
            keywords: default_install_keywords(),
            poll_interval_ms: 300,
            settle_ms: 1500,
            max_clicks: 10,
            timeout_secs: 120,
            transport: "adb".into(),
            adb_serial: None,
            dump_path: "/sdcard/anthroid_ui.xml".into(),
        }
    }
}

fn default_install_keywords() -> Vec<String> {
    // Localized installer buttons first, generic English labels last.
    [
        "重新安装",
        "继续安装",
        "仍要安装",
        "安装完成",
        "完成",
        "确定",
        "允许",
        "安装",
        "继续",
        "下一步",
        "Install",
        "Continue",
        "Done",
        "OK",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Output format: "pretty" or "json". Logs always go to stderr.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            WarningSeverity::Error => "error",
            WarningSeverity::Warning => "warning",
            WarningSeverity::Info => "info",
        };
        write!(f, "[{}] {}: {}", tag, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, " ({})", h)?;
        }
        Ok(())
    }
}

impl AnthroidConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        if self.commands.shell.trim().is_empty() {
            warnings.push(ConfigWarning {
                field: "commands.shell".into(),
                message: "shell is empty".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 'sh' or '/system/bin/sh'".into()),
            });
        }

        if self.commands.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                field: "commands.timeout_secs".into(),
                message: "timeout is 0, every command would time out immediately".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 30".into()),
            });
        }

        if self.bridge.enabled {
            if self.bridge.poll_attempts == 0 {
                warnings.push(ConfigWarning {
                    field: "bridge.poll_attempts".into(),
                    message: "no polling attempts, proxy tools will always time out".into(),
                    severity: WarningSeverity::Error,
                    hint: Some("Set to e.g. 30".into()),
                });
            }
            if self.bridge.result_file.as_os_str().is_empty() {
                warnings.push(ConfigWarning {
                    field: "bridge.result_file".into(),
                    message: "result file path is empty".into(),
                    severity: WarningSeverity::Error,
                    hint: Some("Set to e.g. '/sdcard/anthroid_tool_result.txt'".into()),
                });
            }
        } else {
            warnings.push(ConfigWarning {
                field: "bridge.enabled".into(),
                message: "proxy tools disabled, advertising six tools".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        if self.clicker.keywords.is_empty() {
            warnings.push(ConfigWarning {
                field: "clicker.keywords".into(),
                message: "keyword list is empty, the clicker will never click".into(),
                severity: WarningSeverity::Warning,
                hint: None,
            });
        }

        if self.clicker.max_clicks == 0 {
            warnings.push(ConfigWarning {
                field: "clicker.max_clicks".into(),
                message: "max_clicks is 0, the clicker will stop after its first click".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set to e.g. 10".into()),
            });
        }

        let valid_transports = ["adb", "local"];
        if !valid_transports.contains(&self.clicker.transport.as_str()) {
            warnings.push(ConfigWarning {
                field: "clicker.transport".into(),
                message: format!("unknown transport '{}'", self.clicker.transport),
                severity: WarningSeverity::Error,
                hint: Some(format!("Valid values: {}", valid_transports.join(", "))),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}', using pretty", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| w.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(errors.join("\n"));
        }

        Ok(warnings)
    }
}
