//! # anthroid-config
//!
//! Configuration system for the Anthroid bridge. Reads from `anthroid.toml`,
//! then applies environment variable overrides on top.

pub mod schema;
pub mod loader;

pub use schema::AnthroidConfig;
pub use schema::{
    BridgeConfig, ClickerConfig, CommandsConfig, ConfigWarning, LoggingConfig, ServerConfig,
    WarningSeverity,
};
pub use loader::ConfigLoader;
