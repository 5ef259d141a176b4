//! # anthroid-cli
//!
//! Command-line interface for the Anthroid bridge.
//!
//! ## Commands
//!
//! - `anthroid serve` - Run the MCP server on stdin/stdout
//! - `anthroid click [TIMEOUT]` - Auto-confirm APK install dialogs
//! - `anthroid tools` - Print the advertised tool descriptors
//! - `anthroid config` - Show the effective configuration

pub mod commands;

pub use commands::Cli;
