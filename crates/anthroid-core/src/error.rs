use std::time::Duration;
use thiserror::Error;

/// Unified error type for the Anthroid bridge.
#[derive(Error, Debug)]
pub enum AnthroidError {
    // ── Command errors ─────────────────────────────────────────
    #[error("failed to run {program}: {reason}")]
    CommandLaunch { program: String, reason: String },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    CommandTimeout { program: String, timeout: Duration },

    /// An optional helper utility is not installed. The message is shown
    /// verbatim to the calling agent.
    #[error("{utility} not available. Install {package} package.")]
    UtilityMissing { utility: String, package: String },

    // ── Companion app bridge ───────────────────────────────────
    #[error("Tool execution timeout")]
    BridgeTimeout,

    // ── Tool errors ────────────────────────────────────────────
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    // ── UI automation ──────────────────────────────────────────
    #[error("ui automation error: {0}")]
    UiAutomation(String),

    // ── Protocol / config ──────────────────────────────────────
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AnthroidError>;
