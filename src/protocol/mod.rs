//! MCP protocol: JSON-RPC 2.0 envelope plus the MCP-specific message shapes
//! the gateway actually speaks (`initialize`, `tools/list`, `tools/call`).

pub mod capabilities;
pub mod jsonrpc;
pub mod messages;

pub use capabilities::{ClientCapabilities, ServerCapabilities, ToolsCapability};
pub use jsonrpc::{JsonRpcError, JsonRpcErrorCode, JsonRpcRequest, JsonRpcResponse};
pub use messages::{
    ClientInfo, InitializeParams, InitializeResult, ServerIdentity, ServerInfo, Tool, ToolContent,
    ToolsCallParams, ToolsCallResult, ToolsListResult,
};

/// Protocol versions this gateway accepts during `initialize` negotiation.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

pub const SERVER_NAME: &str = "oic-mcp-gateway";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn negotiate_protocol_version(requested: &str) -> String {
    if SUPPORTED_PROTOCOL_VERSIONS.contains(&requested) {
        requested.to_string()
    } else {
        SUPPORTED_PROTOCOL_VERSIONS
            .last()
            .unwrap_or(&"2025-06-18")
            .to_string()
    }
}
