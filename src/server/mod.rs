//! Server-side MCP plumbing: the tool catalog, the dispatcher that resolves
//! and executes tool calls against it, and the session registry shared by
//! both wire transports.

pub mod dispatcher;
pub mod session;
pub mod tools;

use std::sync::Arc;

use crate::config::TenantRegistry;
use crate::token::TokenCache;
use crate::upstream::UpstreamClient;

pub use dispatcher::Dispatcher;
pub use session::{Session, SessionRegistry};

/// Process-wide gateway state shared across both transports (`axum::Router`
/// state), grounded on `ratchet-mcp::server::mod::McpServer`.
#[derive(Clone)]
pub struct GatewayState {
    pub dispatcher: Arc<Dispatcher>,
    pub sessions: Arc<SessionRegistry>,
}

impl GatewayState {
    pub fn new(tenants: TenantRegistry, http: reqwest::Client) -> Self {
        let tokens = Arc::new(TokenCache::new(http.clone()));
        let upstream = Arc::new(UpstreamClient::new(http, tokens.clone()));
        Self {
            dispatcher: Arc::new(Dispatcher::new(tenants, tokens, upstream)),
            sessions: Arc::new(SessionRegistry::new()),
        }
    }
}
