//! # anthroid-server
//!
//! MCP server for the Anthroid bridge. Speaks newline-delimited JSON-RPC 2.0:
//! one request object per input line, one response object per output line.
//!
//! The server is generic over its reader and writer; the CLI hands it
//! stdin/stdout, tests hand it in-memory buffers.

pub mod protocol;
pub mod server;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND};
pub use server::McpServer;
