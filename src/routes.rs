//! The two plain HTTP routes that sit alongside the MCP transports:
//! `/health` for liveness checks and `/` for a human-readable server
//! identity summary (spec.md §6). Grounded on
//! `ratchet-mcp::server::mod::McpServer`'s `mcp_health_handler` /
//! `connection_info_handler`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::protocol::{self, ServerIdentity};
use crate::server::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new().route("/health", get(health)).route("/", get(identity))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": protocol::SERVER_VERSION,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn identity(State(state): State<GatewayState>) -> Json<ServerIdentity> {
    Json(ServerIdentity {
        name: protocol::SERVER_NAME.to_string(),
        version: protocol::SERVER_VERSION.to_string(),
        tool_count: state.dispatcher.tool_count(),
        metadata: Default::default(),
    })
}
