//! Direct device operations.
//!
//! Each operation wraps one OS command (`am`, `pm`, `monkey`) or a Termux API
//! utility and turns its output into the text handed back to the agent.
//!
//! # Requirements
//!
//! Runs inside the Anthroid/Termux environment on the device. Location,
//! calendar and toast support need the `termux-api` package.

use anthroid_core::{AnthroidError, Result};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::runner::{CommandRunner, Invocation, escape_double_quoted};

const TERMUX_API_PACKAGE: &str = "termux-api";
const TOAST_TIMEOUT: Duration = Duration::from_secs(5);
const LOCATION_TIMEOUT: Duration = Duration::from_secs(30);
const CALENDAR_TIMEOUT: Duration = Duration::from_secs(10);

/// Which installed packages `list_apps` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppFilter {
    /// Third-party packages (`pm list packages -3`).
    User,
    /// System packages (`pm list packages -s`).
    System,
    All,
}

impl AppFilter {
    /// Parse a filter name. Anything other than "user" or "system" lists everything.
    pub fn from_name(name: &str) -> Self {
        match name {
            "user" => AppFilter::User,
            "system" => AppFilter::System,
            _ => AppFilter::All,
        }
    }

    fn pm_command(self) -> &'static str {
        match self {
            AppFilter::User => "pm list packages -3",
            AppFilter::System => "pm list packages -s",
            AppFilter::All => "pm list packages",
        }
    }
}

/// Executes device operations through a [`CommandRunner`].
pub struct AndroidBridge {
    runner: Arc<dyn CommandRunner>,
    /// Directory receiving the notification fallback file.
    home: PathBuf,
}

impl AndroidBridge {
    pub fn new(runner: Arc<dyn CommandRunner>, home: PathBuf) -> Self {
        Self { runner, home }
    }

    /// Show a toast via `termux-toast`, or leave a notification request for
    /// the Anthroid app when the utility can't be started.
    pub async fn show_notification(&self, title: &str, message: &str) -> Result<String> {
        let toast = Invocation::new("termux-toast", TOAST_TIMEOUT).args(["-s", message]);
        match self.runner.exec(&toast).await {
            Ok(_) => return Ok(format!("Toast shown: {message}")),
            Err(e) => debug!(error = %e, "termux-toast unavailable, writing notification request"),
        }

        let path = self.home.join(".notification_request");
        let request = json!({
            "title": title,
            "message": message,
            "time": chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
        });
        tokio::fs::write(&path, serde_json::to_vec(&request)?).await?;
        info!(?path, "notification request written");
        Ok(format!("Notification requested: {title} - {message}"))
    }

    /// Open a URL with the default handler.
    pub async fn open_url(&self, url: &str) -> Result<String> {
        self.runner
            .run_shell(&format!(
                "am start -a android.intent.action.VIEW -d \"{}\"",
                escape_double_quoted(url)
            ))
            .await
    }

    /// Launch an app's launcher activity.
    pub async fn launch_app(&self, package: &str) -> Result<String> {
        validate_package_name(package)?;
        self.runner
            .run_shell(&format!(
                "monkey -p {package} -c android.intent.category.LAUNCHER 1"
            ))
            .await
    }

    /// List installed package names as a pretty JSON array, at most `limit` entries.
    pub async fn list_apps(&self, filter: AppFilter, limit: usize) -> Result<String> {
        let output = self.runner.run_shell(filter.pm_command()).await?;
        let mut packages = parse_package_list(&output);
        packages.truncate(limit);
        Ok(serde_json::to_string_pretty(&packages)?)
    }

    /// Current location as reported by `termux-location`.
    pub async fn get_location(&self) -> Result<String> {
        self.termux("termux-location", LOCATION_TIMEOUT).await
    }

    /// Calendar events as reported by `termux-calendar-list`.
    pub async fn query_calendar(&self) -> Result<String> {
        self.termux("termux-calendar-list", CALENDAR_TIMEOUT).await
    }

    /// Run a Termux API utility and return its stdout.
    async fn termux(&self, utility: &str, timeout: Duration) -> Result<String> {
        match self.runner.exec(&Invocation::new(utility, timeout)).await {
            Ok(out) => Ok(out.stdout),
            Err(AnthroidError::CommandLaunch { .. }) => Err(AnthroidError::UtilityMissing {
                utility: utility.into(),
                package: TERMUX_API_PACKAGE.into(),
            }),
            Err(e) => Err(e),
        }
    }
}

/// Extract package names from `pm list packages` output.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim_end().strip_prefix("package:"))
        .map(String::from)
        .collect()
}

/// Package names are dot-separated Java identifiers; anything else would be
/// interpreted by the shell.
fn validate_package_name(package: &str) -> Result<()> {
    let valid = !package.is_empty()
        && package
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(AnthroidError::InvalidArgument {
            name: "package".into(),
            reason: format!("'{package}' is not a valid package name"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_package_list_skips_noise() {
        let output = "package:com.example.a\r\nWARNING: linker\npackage:com.example.b\n\n";
        assert_eq!(
            parse_package_list(output),
            vec!["com.example.a".to_string(), "com.example.b".to_string()]
        );
    }

    #[test]
    fn test_app_filter_from_name() {
        assert_eq!(AppFilter::from_name("user"), AppFilter::User);
        assert_eq!(AppFilter::from_name("system"), AppFilter::System);
        assert_eq!(AppFilter::from_name("all"), AppFilter::All);
        assert_eq!(AppFilter::from_name("weird"), AppFilter::All);
    }

    #[test]
    fn test_validate_package_name() {
        assert!(validate_package_name("com.android.chrome").is_ok());
        assert!(validate_package_name("com.foo_bar.app2").is_ok());
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("com.x; rm -rf /").is_err());
    }
}
