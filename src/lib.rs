//! OIC monitoring MCP gateway: a dual-transport MCP server that mediates
//! between MCP clients and a tenant's Oracle-Integration-Cloud-shaped
//! monitoring REST APIs.

pub mod config;
pub mod error;
pub mod protocol;
pub mod routes;
pub mod server;
pub mod token;
pub mod transport;
pub mod upstream;

pub use error::{GatewayError, GatewayResult};
pub use server::GatewayState;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assembles the full HTTP surface: both MCP transports plus the plain
/// `/health` and `/` routes, merged into one `axum::Router` (spec.md §4.1
/// "two wire transports... bound to distinct URL paths on a single HTTP
/// listener"). Per-call deadlines (spec.md §5) are enforced inside the
/// dispatcher, not as a blanket HTTP layer, since the latter would also
/// truncate the long-lived `/sse` and `/stream` push streams.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .merge(routes::routes())
        .merge(transport::sse::routes())
        .merge(transport::streamable::routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
