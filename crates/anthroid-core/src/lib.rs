//! # anthroid-core
//!
//! Core types, traits, and primitives for the Anthroid tool bridge.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod error;
pub mod tool;

pub use error::{AnthroidError, Result};
pub use tool::{Tool, ToolExecutor, ToolResult};
