//! JSON-RPC method dispatch: `initialize`, `tools/list`, `tools/call`.
//! Grounded on `ratchet-mcp::server::handler::McpRequestHandler`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::config::TenantRegistry;
use crate::error::GatewayError;
use crate::protocol::{
    self, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerInfo,
    ToolsCallParams, ToolsCallResult, ToolsListResult,
};
use crate::token::TokenCache;
use crate::upstream::UpstreamClient;

use super::tools::{OperationKind, ResponseKind, ToolCatalog, ToolContext};

/// Recommended upper bound for a paginated tool call (spec.md §5).
const PAGINATED_DEADLINE: std::time::Duration = std::time::Duration::from_secs(120);
/// Recommended upper bound for every other tool call (spec.md §5).
const DEFAULT_DEADLINE: std::time::Duration = std::time::Duration::from_secs(30);

pub struct Dispatcher {
    catalog: ToolCatalog,
    tenants: TenantRegistry,
    tokens: Arc<TokenCache>,
    upstream: Arc<UpstreamClient>,
}

impl Dispatcher {
    pub fn new(tenants: TenantRegistry, tokens: Arc<TokenCache>, upstream: Arc<UpstreamClient>) -> Self {
        Self {
            catalog: ToolCatalog::build(),
            tenants,
            tokens,
            upstream,
        }
    }

    pub fn tool_count(&self) -> usize {
        self.catalog.len()
    }

    /// Handles one JSON-RPC request, returning `None` for notifications
    /// (spec.md §4.1: notifications carry no response).
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.is_notification();
        let id = request.id.clone();

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "notifications/initialized" => Ok(Value::Null),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(request.params).await,
            other => {
                if is_notification {
                    return None;
                }
                return Some(JsonRpcResponse::error(JsonRpcError::method_not_found(other), id));
            }
        };

        if is_notification {
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(value, id),
            Err(err) => JsonRpcResponse::error(JsonRpcError::invalid_params(err.to_string()), id),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, GatewayError> {
        let params: InitializeParams = match params {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(GatewayError::invalid_arguments("params", "initialize requires params")),
        };
        let result = InitializeResult {
            protocol_version: protocol::negotiate_protocol_version(&params.protocol_version),
            capabilities: Default::default(),
            server_info: ServerInfo {
                name: protocol::SERVER_NAME.to_string(),
                version: protocol::SERVER_VERSION.to_string(),
            },
        };
        Ok(serde_json::to_value(result)?)
    }

    fn handle_tools_list(&self) -> Value {
        let result = ToolsListResult {
            tools: self.catalog.list(),
        };
        serde_json::to_value(result).unwrap_or(Value::Null)
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, GatewayError> {
        let params: ToolsCallParams = match params {
            Some(value) => serde_json::from_value(value)?,
            None => return Err(GatewayError::invalid_arguments("params", "tools/call requires params")),
        };

        let outcome = self.call_tool(&params.name, params.arguments.unwrap_or_else(|| json!({}))).await;
        let call_result = match outcome {
            Ok(result) => result,
            Err(err) => Self::shape_error(&params.name, err),
        };
        Ok(serde_json::to_value(call_result)?)
    }

    /// Resolve → validate → resolve tenant → invoke handler (spec.md §4.3
    /// steps 1–5; token acquisition happens lazily inside the Upstream
    /// Client primitives the handler calls, step 4's effect without a
    /// separate pre-fetch).
    async fn call_tool(&self, name: &str, args: Value) -> Result<ToolsCallResult, GatewayError> {
        let definition = self
            .catalog
            .get(name)
            .ok_or_else(|| GatewayError::UnknownTool { name: name.to_string() })?;

        if let Err(errors) = definition.validator.validate(&args) {
            let message = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            let field = args_error_field(&message);
            return Err(GatewayError::invalid_arguments(field, message));
        }

        let tenant = args
            .get("tenant")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::invalid_arguments("tenant", "tenant is required"))?;
        let config = self.tenants.config_for(tenant)?.clone();

        let ctx = Arc::new(ToolContext {
            tenant: tenant.to_string(),
            config,
            upstream: self.upstream.clone(),
        });

        let deadline = if definition.operation_kind == OperationKind::Paginated {
            PAGINATED_DEADLINE
        } else {
            DEFAULT_DEADLINE
        };
        let value = match tokio::time::timeout(deadline, (definition.handler)(ctx, args)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(GatewayError::RequestCancelled {
                    reason: format!("{name} exceeded its {deadline:?} deadline"),
                })
            }
        };
        match definition.response_kind {
            ResponseKind::Text => {
                let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                Ok(ToolsCallResult::text(text))
            }
            ResponseKind::Json => ToolsCallResult::json(&value).map_err(GatewayError::from),
        }
    }

    /// Renders a classified failure as `isError=true` content with the
    /// stable wording spec.md §7 names (test-assertable).
    fn shape_error(tool: &str, err: GatewayError) -> ToolsCallResult {
        if !err.is_client_fault() {
            warn!(tool, error = %err, "tool call failed");
        }
        ToolsCallResult::error(err.to_string())
    }

    /// Graceful shutdown: evict every cached token so no stale bearer
    /// survives past this process (spec.md §4.4 "startup/shutdown hygiene").
    pub async fn shutdown(&self) {
        self.tokens.evict_all().await;
    }
}

fn args_error_field(message: &str) -> &str {
    if message.contains("is a required property") {
        "required"
    } else {
        "arguments"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dispatcher() -> Dispatcher {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenCache::new(http.clone()));
        let upstream = Arc::new(UpstreamClient::new(http, tokens.clone()));
        Dispatcher::new(TenantRegistry::from_env(), tokens, upstream)
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_mcp_error_content() {
        let dispatcher = test_dispatcher();
        let err = dispatcher.call_tool("does.not.exist", json!({})).await.unwrap_err();
        assert!(matches!(err, GatewayError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn missing_required_argument_is_invalid_arguments_before_any_dispatch() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .call_tool("monitoringInstanceDetails", json!({"tenant": "dev"}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn unknown_tenant_fails_before_any_token_acquisition() {
        let dispatcher = test_dispatcher();
        let err = dispatcher
            .call_tool("monitoringInstances", json!({"tenant": "staging"}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::UnknownTenant { .. }));
    }

    #[tokio::test]
    async fn tools_list_is_stable_across_repeated_calls() {
        let dispatcher = test_dispatcher();
        let first = dispatcher.handle_tools_list();
        let second = dispatcher.handle_tools_list();
        assert_eq!(first, second);
    }
}
