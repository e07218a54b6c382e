//! Declarative tool catalog: one [`ToolDefinition`] per entry, a function
//! table with no inheritance or reflection (spec.md §9), grounded on
//! `ratchet-mcp::server::tools::RatchetToolRegistry::register_builtin_tools`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::{TenantConfig, TENANT_IDS};
use crate::error::GatewayError;
use crate::protocol::Tool;
use crate::upstream::{PaginatedQuery, UpstreamClient};
use crate::GatewayResult;

/// Everything a handler needs: the resolved tenant, its config, and the
/// shared upstream client. Handlers never touch the token cache directly
/// (spec.md §4.3: "handlers must NOT perform their own token acquisition").
pub struct ToolContext {
    pub tenant: String,
    pub config: TenantConfig,
    pub upstream: Arc<UpstreamClient>,
}

impl ToolContext {
    fn resource_url(&self, path: &str) -> String {
        format!(
            "{}/ic/api/integration/v1/monitoring{}",
            self.config.api_base_url.trim_end_matches('/'),
            path
        )
    }
}

/// Whether a handler's JSON payload should be rendered as a text block
/// verbatim (the logs tool, which returns raw log text) or serialized as
/// JSON (everything else, spec.md §4.5 "parsed as JSON, or returned as text
/// for the logs tool").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Text,
}

/// The spec's "Kind" column (§5): which primitive the handler drives, used
/// by the dispatcher to size the per-call deadline (spec.md §5 "120 seconds
/// for paginated tools, 30 seconds otherwise").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Single,
    Paginated,
    Post,
    Bulk,
}

type HandlerFuture = Pin<Box<dyn Future<Output = GatewayResult<Value>> + Send>>;
pub type HandlerFn = fn(Arc<ToolContext>, Value) -> HandlerFuture;

pub struct ToolDefinition {
    pub tool: Tool,
    pub family: &'static str,
    pub response_kind: ResponseKind,
    pub operation_kind: OperationKind,
    pub validator: jsonschema::JSONSchema,
    pub handler: HandlerFn,
}

pub struct ToolCatalog {
    tools: HashMap<String, ToolDefinition>,
    /// `tools/list` order, stable across a process lifetime (spec.md §8 L2).
    order: Vec<String>,
}

impl ToolCatalog {
    pub fn build() -> Self {
        let mut tools = HashMap::new();
        let mut order = Vec::new();
        for entry in catalog_entries() {
            order.push(entry.tool.name.clone());
            tools.insert(entry.tool.name.clone(), entry);
        }
        Self { tools, order }
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn list(&self) -> Vec<Tool> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|def| def.tool.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn entry(
    name: &str,
    description: &str,
    family: &'static str,
    schema: Value,
    response_kind: ResponseKind,
    operation_kind: OperationKind,
    handler: HandlerFn,
) -> ToolDefinition {
    let validator = jsonschema::JSONSchema::compile(&schema)
        .unwrap_or_else(|err| panic!("tool '{name}' has an invalid input schema: {err}"));
    ToolDefinition {
        tool: Tool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema,
        },
        family,
        response_kind,
        operation_kind,
        validator,
        handler,
    }
}

/// Base schema shared by every tenant-scoped tool: `tenant` is always
/// required (spec.md §9 "tenant is always a required argument, there is no
/// implicit default").
fn tenant_property() -> Value {
    json!({
        "type": "string",
        "description": "Target tenant environment",
        "enum": TENANT_IDS,
    })
}

fn id_property(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn duration_property() -> Value {
    json!({
        "type": "string",
        "description": "Lookback window, e.g. '1h', '1d', '7d'",
        "default": "1h",
    })
}

fn status_property() -> Value {
    json!({
        "type": "string",
        "description": "Filter by status",
        "enum": ["IN_PROGRESS", "COMPLETED", "FAILED", "ABORTED"],
    })
}

fn ids_property(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "minItems": 1,
        "maxItems": crate::upstream::MAX_BULK_IDS,
        "description": description,
    })
}

fn list_schema(extra: Vec<(&str, Value)>, required_extra: &[&str]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("tenant".to_string(), tenant_property());
    properties.insert("duration".to_string(), duration_property());
    properties.insert("status".to_string(), status_property());
    properties.insert(
        "orderBy".to_string(),
        json!({"type": "string", "description": "Upstream orderBy expression"}),
    );
    properties.insert(
        "fields".to_string(),
        json!({"type": "string", "description": "Comma-separated projection of fields to return"}),
    );
    for (name, schema) in extra {
        properties.insert(name.to_string(), schema);
    }
    let mut required = vec!["tenant".to_string()];
    required.extend(required_extra.iter().map(|s| s.to_string()));
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    })
}

fn detail_schema(extra: Vec<(&str, Value)>, required_extra: &[&str]) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert("tenant".to_string(), tenant_property());
    for (name, schema) in extra {
        properties.insert(name.to_string(), schema);
    }
    let mut required = vec!["tenant".to_string()];
    required.extend(required_extra.iter().map(|s| s.to_string()));
    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": required,
    })
}

/// Composes the upstream's opaque `q` expression from the high-level
/// arguments a tool actually exposes (spec.md §6: "composes tenant-agnostic
/// tools that build it from high-level parameters").
fn build_filter(duration: Option<&str>, status: Option<&str>) -> String {
    let mut clauses = Vec::new();
    if let Some(duration) = duration.filter(|d| !d.is_empty()) {
        clauses.push(format!("timewindow:'{duration}'"));
    }
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        clauses.push(format!("status:'{status}'"));
    }
    if clauses.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", clauses.join(", "))
    }
}

fn str_arg<'a>(args: &'a Value, field: &str) -> GatewayResult<&'a str> {
    args.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::invalid_arguments(field, "required string argument is missing"))
}

fn opt_str_arg<'a>(args: &'a Value, field: &str) -> Option<&'a str> {
    args.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn str_array_arg(args: &Value, field: &str) -> GatewayResult<Vec<String>> {
    let items = args
        .get(field)
        .and_then(Value::as_array)
        .ok_or_else(|| GatewayError::invalid_arguments(field, "required array argument is missing"))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| GatewayError::invalid_arguments(field, "array entries must be strings"))
        })
        .collect()
}

fn extra_params(ctx: &ToolContext) -> Vec<(String, String)> {
    vec![(
        "integrationInstance".to_string(),
        ctx.config.integration_instance.clone(),
    )]
}

fn list_query(args: &Value, ctx: &ToolContext) -> PaginatedQuery {
    let duration = opt_str_arg(args, "duration");
    let status = opt_str_arg(args, "status");
    let mut extra = extra_params(ctx);
    if let Some(order_by) = opt_str_arg(args, "orderBy") {
        extra.push(("orderBy".to_string(), order_by.to_string()));
    }
    if let Some(fields) = opt_str_arg(args, "fields") {
        extra.push(("fields".to_string(), fields.to_string()));
    }
    PaginatedQuery {
        filter: build_filter(duration, status),
        extra,
    }
}

macro_rules! boxed_handler {
    ($body:expr) => {{
        fn handler(ctx: Arc<ToolContext>, args: Value) -> HandlerFuture {
            Box::pin(async move { $body(ctx, args).await })
        }
        handler as HandlerFn
    }};
}

fn catalog_entries() -> Vec<ToolDefinition> {
    vec![
        entry(
            "monitoringInstances",
            "List integration flow instances for a tenant, optionally filtered by duration and status.",
            "instances",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(list_instances),
            ),
        entry(
            "monitoringInstanceDetails",
            "Fetch full details for a single integration flow instance.",
            "instances",
            detail_schema(vec![("id", id_property("Instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(instance_details),
            ),
        entry(
            "monitoringInstanceActivityStream",
            "List the activity stream entries recorded for an instance.",
            "instances",
            list_schema(vec![("id", id_property("Instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(instance_activity_stream),
            ),
        entry(
            "monitoringInstanceActivityStreamDetail",
            "Fetch a single activity stream entry for an instance by item key.",
            "instances",
            detail_schema(
                vec![
                    ("id", id_property("Instance id")),
                    ("activityItemKey", id_property("Activity stream item key")),
                ],
                &["id", "activityItemKey"],
            ),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(instance_activity_stream_detail),
            ),
        entry(
            "monitoringInstanceLogs",
            "Fetch the raw execution log text for an instance.",
            "instances",
            detail_schema(vec![("id", id_property("Instance id"))], &["id"]),
            ResponseKind::Text,
            OperationKind::Single,
            boxed_handler!(instance_logs),
            ),
        entry(
            "monitoringAbortInstance",
            "Abort a running integration flow instance.",
            "instances",
            detail_schema(vec![("id", id_property("Instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Post,
            boxed_handler!(abort_instance),
            ),
        entry(
            "monitoringIntegrations",
            "List deployed integrations for a tenant.",
            "integrations",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(list_integrations),
            ),
        entry(
            "monitoringIntegrationDetails",
            "Fetch details for a single deployed integration.",
            "integrations",
            detail_schema(vec![("id", id_property("Integration id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(integration_details),
            ),
        entry(
            "monitoringIntegrationMessageCount",
            "Fetch the message-count summary for an integration.",
            "integrations",
            detail_schema(vec![("id", id_property("Integration id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(integration_message_count),
            ),
        entry(
            "monitoringIntegrationHistory",
            "List execution history for an integration.",
            "integrations",
            list_schema(vec![("id", id_property("Integration id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(integration_history),
            ),
        entry(
            "monitoringAgentGroups",
            "List connectivity agent groups for a tenant.",
            "agents",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(agent_groups),
            ),
        entry(
            "monitoringAgentGroupDetails",
            "Fetch details for a single agent group.",
            "agents",
            detail_schema(vec![("id", id_property("Agent group id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(agent_group_details),
            ),
        entry(
            "monitoringAgentsInGroup",
            "List the agents registered under an agent group.",
            "agents",
            list_schema(vec![("id", id_property("Agent group id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(agents_in_group),
            ),
        entry(
            "monitoringAgentDetails",
            "Fetch details for a single connectivity agent.",
            "agents",
            detail_schema(vec![("id", id_property("Agent id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(agent_details),
            ),
        entry(
            "monitoringErroredInstances",
            "List instances currently in an errored state.",
            "errors",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(errored_instances),
            ),
        entry(
            "monitoringErroredInstanceDetails",
            "Fetch details for a single errored instance.",
            "errors",
            detail_schema(vec![("id", id_property("Errored instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(errored_instance_details),
            ),
        entry(
            "monitoringDiscardErroredInstance",
            "Discard a single errored instance.",
            "errors",
            detail_schema(vec![("id", id_property("Errored instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Post,
            boxed_handler!(discard_errored_instance),
            ),
        entry(
            "monitoringDiscardErroredInstances",
            "Discard up to 50 errored instances in one call.",
            "errors",
            detail_schema(
                vec![("instanceIds", ids_property("Errored instance ids to discard (max 50)"))],
                &["instanceIds"],
            ),
            ResponseKind::Json,
            OperationKind::Bulk,
            boxed_handler!(discard_errored_instances),
            ),
        entry(
            "monitoringResubmitErroredInstance",
            "Resubmit a single errored instance for recovery.",
            "errors",
            detail_schema(vec![("id", id_property("Errored instance id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Post,
            boxed_handler!(resubmit_errored_instance),
            ),
        entry(
            "monitoringResubmitErroredInstances",
            "Resubmit up to 50 errored instances for recovery in one call.",
            "errors",
            detail_schema(
                vec![("instanceIds", ids_property("Errored instance ids to resubmit (max 50)"))],
                &["instanceIds"],
            ),
            ResponseKind::Json,
            OperationKind::Bulk,
            boxed_handler!(resubmit_errored_instances),
            ),
        entry(
            "monitoringErrorRecoveryJobs",
            "List error recovery jobs submitted for a tenant.",
            "recovery-jobs",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(error_recovery_jobs),
            ),
        entry(
            "monitoringErrorRecoveryJobDetails",
            "Fetch details and per-instance outcomes for a recovery job.",
            "recovery-jobs",
            detail_schema(vec![("id", id_property("Recovery job id"))], &["id"]),
            ResponseKind::Json,
            OperationKind::Single,
            boxed_handler!(error_recovery_job_details),
            ),
        entry(
            "monitoringAuditRecords",
            "List audit records for a tenant.",
            "audit",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(audit_records),
            ),
        entry(
            "monitoringScheduledRuns",
            "List scheduled integration runs for a tenant.",
            "scheduled-runs",
            list_schema(vec![], &[]),
            ResponseKind::Json,
            OperationKind::Paginated,
            boxed_handler!(scheduled_runs),
            ),
    ]
}

async fn paginated_result(
    tool: &'static str,
    path: String,
    ctx: Arc<ToolContext>,
    query: PaginatedQuery,
) -> GatewayResult<Value> {
    let url = ctx.resource_url(&path);
    let result = ctx
        .upstream
        .get_paginated(tool, &url, query, &ctx.tenant, &ctx.config)
        .await?;
    Ok(json!({
        "total": result.total,
        "retrieved": result.retrieved,
        "items": result.items,
    }))
}

async fn single_result(tool: &'static str, path: String, ctx: Arc<ToolContext>) -> GatewayResult<Value> {
    let url = ctx.resource_url(&path);
    let params = extra_params(&ctx);
    ctx.upstream.get_single(tool, &url, &params, &ctx.tenant, &ctx.config).await
}

async fn list_instances(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringInstances", "/instances".to_string(), ctx, query).await
}

async fn instance_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringInstanceDetails", format!("/instances/{id}"), ctx).await
}

async fn instance_activity_stream(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let query = list_query(&args, &ctx);
    paginated_result(
        "monitoringInstanceActivityStream",
        format!("/instances/{id}/activity-stream"),
        ctx,
        query,
    )
    .await
}

async fn instance_activity_stream_detail(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let key = str_arg(&args, "activityItemKey")?.to_string();
    single_result(
        "monitoringInstanceActivityStreamDetail",
        format!("/instances/{id}/activity-stream/{key}"),
        ctx,
    )
    .await
}

async fn instance_logs(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringInstanceLogs", format!("/instances/{id}/logs"), ctx).await
}

async fn abort_instance(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let url = ctx.resource_url(&format!("/instances/{id}/abort"));
    ctx.upstream
        .post("monitoringAbortInstance", &url, Some(&json!({})), &ctx.tenant, &ctx.config)
        .await
}

async fn list_integrations(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringIntegrations", "/integrations".to_string(), ctx, query).await
}

async fn integration_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringIntegrationDetails", format!("/integrations/{id}"), ctx).await
}

async fn integration_message_count(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result(
        "monitoringIntegrationMessageCount",
        format!("/integrations/{id}/message-count"),
        ctx,
    )
    .await
}

async fn integration_history(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let query = list_query(&args, &ctx);
    paginated_result(
        "monitoringIntegrationHistory",
        format!("/integrations/{id}/history"),
        ctx,
        query,
    )
    .await
}

async fn agent_groups(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringAgentGroups", "/agent-groups".to_string(), ctx, query).await
}

async fn agent_group_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringAgentGroupDetails", format!("/agent-groups/{id}"), ctx).await
}

async fn agents_in_group(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let query = list_query(&args, &ctx);
    paginated_result(
        "monitoringAgentsInGroup",
        format!("/agent-groups/{id}/agents"),
        ctx,
        query,
    )
    .await
}

async fn agent_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringAgentDetails", format!("/agents/{id}"), ctx).await
}

async fn errored_instances(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringErroredInstances", "/errors".to_string(), ctx, query).await
}

async fn errored_instance_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringErroredInstanceDetails", format!("/errors/{id}"), ctx).await
}

async fn discard_errored_instance(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let url = ctx.resource_url(&format!("/errors/{id}/discard"));
    ctx.upstream
        .post(
            "monitoringDiscardErroredInstance",
            &url,
            Some(&json!({})),
            &ctx.tenant,
            &ctx.config,
        )
        .await
}

async fn discard_errored_instances(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let ids = str_array_arg(&args, "instanceIds")?;
    let result = ctx
        .upstream
        .bulk_post(
            "monitoringDiscardErroredInstances",
            &ids,
            &ctx.tenant,
            &ctx.config,
            |id| ctx.resource_url(&format!("/errors/{id}/discard")),
        )
        .await?;
    Ok(result.into_json("jobIds"))
}

async fn resubmit_errored_instance(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    let url = ctx.resource_url(&format!("/errors/{id}/resubmit"));
    ctx.upstream
        .post(
            "monitoringResubmitErroredInstance",
            &url,
            Some(&json!({})),
            &ctx.tenant,
            &ctx.config,
        )
        .await
}

async fn resubmit_errored_instances(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let ids = str_array_arg(&args, "instanceIds")?;
    let result = ctx
        .upstream
        .bulk_post(
            "monitoringResubmitErroredInstances",
            &ids,
            &ctx.tenant,
            &ctx.config,
            |id| ctx.resource_url(&format!("/errors/{id}/resubmit")),
        )
        .await?;
    Ok(result.into_json("recoveryJobIds"))
}

async fn error_recovery_jobs(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringErrorRecoveryJobs", "/recovery-jobs".to_string(), ctx, query).await
}

async fn error_recovery_job_details(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let id = str_arg(&args, "id")?.to_string();
    single_result("monitoringErrorRecoveryJobDetails", format!("/recovery-jobs/{id}"), ctx).await
}

async fn audit_records(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringAuditRecords", "/audit-records".to_string(), ctx, query).await
}

async fn scheduled_runs(ctx: Arc<ToolContext>, args: Value) -> GatewayResult<Value> {
    let query = list_query(&args, &ctx);
    paginated_result("monitoringScheduledRuns", "/scheduled-runs".to_string(), ctx, query).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_one_entry_per_table_row() {
        let catalog = ToolCatalog::build();
        assert_eq!(catalog.len(), 24);
    }

    #[test]
    fn every_tool_requires_tenant() {
        let catalog = ToolCatalog::build();
        for tool in catalog.list() {
            let required = tool.input_schema["required"]
                .as_array()
                .expect("schema declares required[]");
            assert!(
                required.iter().any(|v| v == "tenant"),
                "{} does not require tenant",
                tool.name
            );
        }
    }

    #[test]
    fn listing_the_catalog_twice_is_byte_identical() {
        let catalog = ToolCatalog::build();
        let first = serde_json::to_string(&catalog.list()).unwrap();
        let second = serde_json::to_string(&catalog.list()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn filter_combines_duration_and_status() {
        assert_eq!(
            build_filter(Some("1h"), Some("FAILED")),
            "{timewindow:'1h', status:'FAILED'}"
        );
        assert_eq!(build_filter(None, None), "");
    }
}
