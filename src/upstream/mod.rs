//! HTTP access to a tenant's Oracle Integration Cloud monitoring REST APIs:
//! single-resource GETs, date-keyed paginated GETs, mutating POSTs, and the
//! bulk fan-out used by the resubmit/discard-many tools (spec §4.5, §9).

pub mod pagination;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::TenantConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::token::TokenCache;

use pagination::{extract_record_date, rewrite_filter_with_startdate, MAX_BATCHES, OFFSET_CAP, PAGE_LIMIT};

/// The caller-supplied, otherwise-opaque query for a paginated resource.
/// `filter` corresponds to the upstream `q` parameter and is the only part
/// the pagination loop ever rewrites.
#[derive(Debug, Clone, Default)]
pub struct PaginatedQuery {
    pub filter: String,
    /// Additional constant query parameters (`integrationInstance`,
    /// `orderBy`, `fields`, ...), unchanged across batches.
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct PagedResult {
    pub total: u64,
    pub retrieved: u64,
    pub items: Vec<Value>,
}

/// Outcome of one id in a bulk fan-out operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkItemResult {
    pub id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BulkResult {
    pub total_requested: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// Job ids collected from the successful entries of `details`, in
    /// completion order. The tool handler decides the on-wire key name
    /// (`recoveryJobIds` for resubmit, `jobIds` for discard) via
    /// [`BulkResult::into_json`].
    pub job_ids: Vec<String>,
    pub details: Vec<BulkItemResult>,
}

impl BulkResult {
    /// Renders the aggregate as the MCP payload shape, naming the job-id
    /// array `job_id_key` (spec.md §8 scenario 4 names it `recoveryJobIds`
    /// for resubmit; §4.5 names it `jobIds` generically for discard).
    pub fn into_json(self, job_id_key: &str) -> Value {
        serde_json::json!({
            "totalRequested": self.total_requested,
            "successCount": self.success_count,
            "failedCount": self.failed_count,
            job_id_key: self.job_ids,
            "details": self.details,
        })
    }
}

/// Upper bound on ids accepted by a single bulk resubmit/discard call (spec
/// §9): beyond this the request is rejected before any upstream traffic.
pub const MAX_BULK_IDS: usize = 50;

pub struct UpstreamClient {
    http: reqwest::Client,
    tokens: Arc<TokenCache>,
}

impl UpstreamClient {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenCache>) -> Self {
        Self { http, tokens }
    }

    /// GET a single resource, retrying once on 401 with a freshly-acquired
    /// token (spec §4.5 "retry-once-on-401").
    pub async fn get_single(
        &self,
        tool: &str,
        url: &str,
        params: &[(String, String)],
        tenant: &str,
        config: &TenantConfig,
    ) -> GatewayResult<Value> {
        self.get_json_with_retry(tool, url, params, tenant, config)
            .await
    }

    /// POST a mutating request (resubmit/discard one), retrying once on 401.
    pub async fn post(
        &self,
        tool: &str,
        url: &str,
        body: Option<&Value>,
        tenant: &str,
        config: &TenantConfig,
    ) -> GatewayResult<Value> {
        self.post_json_with_retry(tool, url, body, tenant, config)
            .await
    }

    /// Date-keyed batch pagination (spec §4.5): page at `limit=50` until a
    /// short page ends the window; if the window closes at the offset cap
    /// with a full page, read the record date off the last item, rewrite
    /// `filter` with `startdate:'<date>'`, and start a new window at
    /// `offset=0`. Stops when a window ends short, no record date can be
    /// found to advance, or `MAX_BATCHES` windows have been walked.
    pub async fn get_paginated(
        &self,
        tool: &str,
        url: &str,
        mut query: PaginatedQuery,
        tenant: &str,
        config: &TenantConfig,
    ) -> GatewayResult<PagedResult> {
        let mut items = Vec::new();
        let mut total: Option<u64> = None;

        for batch in 0..MAX_BATCHES {
            if batch == MAX_BATCHES - 1 {
                warn!(tool, tenant, "pagination hit the safety bound of batches without exhausting the resource");
            }

            let mut offset: u32 = 0;
            let mut window_closed_at_cap = false;
            let mut last_item: Option<Value> = None;

            loop {
                let mut params = query.extra.clone();
                params.push(("limit".to_string(), PAGE_LIMIT.to_string()));
                params.push(("offset".to_string(), offset.to_string()));
                if !query.filter.trim().is_empty() {
                    params.push(("q".to_string(), query.filter.clone()));
                }

                let page = self
                    .get_json_with_retry(tool, url, &params, tenant, config)
                    .await?;

                let page_items = page
                    .get("items")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                if total.is_none() {
                    total = page.get("totalRecordsCount").and_then(Value::as_u64);
                }

                let page_len = page_items.len() as u32;
                last_item = page_items.last().cloned().or(last_item);
                items.extend(page_items);
                offset += PAGE_LIMIT;

                if page_len < PAGE_LIMIT {
                    window_closed_at_cap = false;
                    break;
                }
                if offset > OFFSET_CAP {
                    window_closed_at_cap = true;
                    break;
                }
            }

            if !window_closed_at_cap {
                break;
            }

            match last_item.as_ref().and_then(extract_record_date) {
                Some(date) => {
                    debug!(tool, tenant, date, "window cap reached, advancing filter");
                    query.filter = rewrite_filter_with_startdate(&query.filter, &date);
                }
                None => {
                    warn!(tool, tenant, "window cap reached but no record date field was found; stopping");
                    break;
                }
            }
        }

        let retrieved = items.len() as u64;
        Ok(PagedResult {
            total: total.unwrap_or(retrieved),
            retrieved,
            items,
        })
    }

    /// Sequentially POST `url_for(id)` for each id, aggregating per-id
    /// outcomes. Rejected outright (no upstream traffic at all) when `ids`
    /// exceeds [`MAX_BULK_IDS`] (spec §9 decision: fan-out of one POST per
    /// id, not a single batched call — see design notes).
    pub async fn bulk_post<F>(
        &self,
        tool: &str,
        ids: &[String],
        tenant: &str,
        config: &TenantConfig,
        url_for: F,
    ) -> GatewayResult<BulkResult>
    where
        F: Fn(&str) -> String,
    {
        if ids.is_empty() {
            return Err(GatewayError::invalid_arguments("ids", "at least one id is required"));
        }
        if ids.len() > MAX_BULK_IDS {
            return Err(GatewayError::invalid_arguments(
                "ids",
                format!("at most {MAX_BULK_IDS} ids are allowed per call, got {}", ids.len()),
            ));
        }

        let mut details = Vec::with_capacity(ids.len());
        let mut success_count = 0usize;

        for id in ids {
            let url = url_for(id);
            match self.post_json_with_retry(tool, &url, None, tenant, config).await {
                Ok(body) => {
                    let job_id = body
                        .get("jobId")
                        .or_else(|| body.get("recoveryJobId"))
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    if mutation_succeeded(&body) {
                        success_count += 1;
                        details.push(BulkItemResult {
                            id: id.clone(),
                            success: true,
                            job_id,
                            error: None,
                        });
                    } else {
                        details.push(BulkItemResult {
                            id: id.clone(),
                            success: false,
                            job_id,
                            error: Some(mutation_failure_message(&body)),
                        });
                    }
                }
                Err(err) => {
                    details.push(BulkItemResult {
                        id: id.clone(),
                        success: false,
                        job_id: None,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let failed_count = details.len() - success_count;
        let job_ids = details
            .iter()
            .filter_map(|d| d.job_id.clone())
            .collect();
        Ok(BulkResult {
            total_requested: ids.len(),
            success_count,
            failed_count,
            job_ids,
            details,
        })
    }

    async fn get_json_with_retry(
        &self,
        tool: &str,
        url: &str,
        params: &[(String, String)],
        tenant: &str,
        config: &TenantConfig,
    ) -> GatewayResult<Value> {
        let token = self.tokens.get(tenant, config).await?;
        match self.send_get(url, params, &token).await {
            Ok(value) => Ok(value),
            Err(GatewayError::AuthenticationFailure { .. }) => {
                self.tokens.evict(tenant).await;
                let retried_token = self.tokens.get(tenant, config).await?;
                self.send_get(url, params, &retried_token).await
            }
            Err(err) => Err(Self::attribute(tool, err)),
        }
        .map_err(|err| Self::attribute(tool, err))
    }

    async fn post_json_with_retry(
        &self,
        tool: &str,
        url: &str,
        body: Option<&Value>,
        tenant: &str,
        config: &TenantConfig,
    ) -> GatewayResult<Value> {
        let token = self.tokens.get(tenant, config).await?;
        match self.send_post(url, body, &token).await {
            Ok(value) => Ok(value),
            Err(GatewayError::AuthenticationFailure { .. }) => {
                self.tokens.evict(tenant).await;
                let retried_token = self.tokens.get(tenant, config).await?;
                self.send_post(url, body, &retried_token).await
            }
            Err(err) => Err(Self::attribute(tool, err)),
        }
        .map_err(|err| Self::attribute(tool, err))
    }

    async fn send_get(&self, url: &str, params: &[(String, String)], token: &str) -> GatewayResult<Value> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn send_post(&self, url: &str, body: Option<&Value>, token: &str) -> GatewayResult<Value> {
        let mut request = self.http.post(url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    async fn parse_response(response: reqwest::Response) -> GatewayResult<Value> {
        let status = response.status();
        if status.as_u16() == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::AuthenticationFailure {
                status: status.as_u16(),
                body,
            });
        }
        if status.as_u16() == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamPermissionDenied { body });
        }
        if status.as_u16() == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamNotFound { body });
        }
        if !status.is_success() {
            let status_text = status.canonical_reason().unwrap_or("").to_string();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamFailure {
                tool: String::new(),
                status: status.as_u16(),
                status_text,
                body,
            });
        }
        if status.as_u16() == 204 {
            return Ok(Value::Null);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(GatewayError::from)
    }

    /// Stamps the tool name into `UpstreamFailure` after the fact, since
    /// [`Self::parse_response`] doesn't know which tool is calling it.
    fn attribute(tool: &str, err: GatewayError) -> GatewayError {
        match err {
            GatewayError::UpstreamFailure {
                status,
                status_text,
                body,
                ..
            } => GatewayError::UpstreamFailure {
                tool: tool.to_string(),
                status,
                status_text,
                body,
            },
            other => other,
        }
    }
}

/// Flag names the upstream's mutation responses use for per-item outcome
/// (spec §6: "a response containing `recoveryJobId` and `resubmitSuccessful`
/// (or equivalent flags)"). Checked in order; the first one present decides
/// the result. Absent entirely, a 2xx body is taken at its word.
const MUTATION_SUCCESS_FLAGS: &[&str] = &["resubmitSuccessful", "discardSuccessful", "successful", "success"];

fn mutation_succeeded(body: &Value) -> bool {
    MUTATION_SUCCESS_FLAGS
        .iter()
        .find_map(|&flag| body.get(flag).and_then(Value::as_bool))
        .unwrap_or(true)
}

fn mutation_failure_message(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("upstream reported failure: {body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> UpstreamClient {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenCache::new(http.clone()));
        UpstreamClient::new(http, tokens)
    }

    #[tokio::test]
    async fn bulk_post_rejects_empty_id_list_without_any_request() {
        let client = test_client();
        let config = TenantConfig::default();
        let err = client
            .bulk_post("resubmit", &[], "dev", &config, |id| format!("/errors/{id}/resubmit"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn bulk_post_rejects_more_than_the_id_limit_without_any_request() {
        let client = test_client();
        let config = TenantConfig::default();
        let ids: Vec<String> = (0..MAX_BULK_IDS + 1).map(|i| i.to_string()).collect();
        let err = client
            .bulk_post("resubmit", &ids, "dev", &config, |id| format!("/errors/{id}/resubmit"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArguments { .. }));
    }

    #[test]
    fn mutation_succeeded_defaults_true_when_no_flag_is_present() {
        assert!(mutation_succeeded(&json!({"recoveryJobId": "J1"})));
    }

    #[test]
    fn mutation_succeeded_honors_an_explicit_false_flag() {
        assert!(!mutation_succeeded(&json!({"resubmitSuccessful": false, "recoveryJobId": "J1"})));
    }

    async fn mock_tenant_config(mock_server: &MockServer) -> TenantConfig {
        TenantConfig {
            client_id: "id".into(),
            client_secret: "secret".into(),
            token_url: format!("{}/token", mock_server.uri()),
            api_base_url: mock_server.uri(),
            scope: String::new(),
            integration_instance: String::new(),
        }
    }

    async fn mount_token_endpoint(mock_server: &MockServer, access_token: &str) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "expires_in": 3600,
            })))
            .mount(mock_server)
            .await;
    }

    fn page_of(count: usize, last_item_extra: Option<(&str, &str)>) -> Value {
        let mut items: Vec<Value> = (0..count).map(|i| json!({"id": format!("i-{i}")})).collect();
        if let Some((field, value)) = last_item_extra {
            if let Some(last) = items.last_mut() {
                last[field] = json!(value);
            }
        }
        Value::Array(items)
    }

    /// spec.md §8 scenario 2: a window that closes at the offset cap
    /// advances the filter with the last item's record date and opens a
    /// fresh window, until a short page ends pagination for good.
    #[tokio::test]
    async fn get_paginated_advances_past_the_offset_cap_with_a_rewritten_filter() {
        let mock_server = MockServer::start().await;
        mount_token_endpoint(&mock_server, "token-1").await;
        let config = mock_tenant_config(&mock_server).await;

        let initial_filter = "{status:'FAILED'}";
        let rewritten_filter = "{status:'FAILED', startdate:'2024-05-01T12:34:56Z'}";

        for offset in (0..=500).step_by(50) {
            let body = if offset == 500 {
                page_of(50, Some(("creation-date", "2024-05-01T12:34:56Z")))
            } else {
                page_of(50, None)
            };
            let mut response = json!({"items": body, "totalRecordsCount": 557});
            if offset != 0 {
                response.as_object_mut().unwrap().remove("totalRecordsCount");
            }
            Mock::given(method("GET"))
                .and(path("/instances"))
                .and(query_param("offset", offset.to_string()))
                .and(query_param("q", initial_filter))
                .respond_with(ResponseTemplate::new(200).set_body_json(response))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        Mock::given(method("GET"))
            .and(path("/instances"))
            .and(query_param("offset", "0"))
            .and(query_param("q", rewritten_filter))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": page_of(7, None),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client();
        let query = PaginatedQuery {
            filter: initial_filter.to_string(),
            extra: Vec::new(),
        };
        let result = client
            .get_paginated(
                "monitoringInstances",
                &format!("{}/instances", mock_server.uri()),
                query,
                "prod1",
                &config,
            )
            .await
            .expect("pagination should succeed");

        assert_eq!(result.items.len(), 557);
        assert_eq!(result.total, 557);
        mock_server.verify().await;
    }

    /// spec.md §8 scenario 3: a 401 on the first GET evicts the cached
    /// token, re-acquires exactly once, and retries; the second GET
    /// succeeds using the fresh token.
    #[tokio::test]
    async fn get_paginated_retries_once_after_a_401_with_a_fresh_token() {
        let mock_server = MockServer::start().await;
        let config = mock_tenant_config(&mock_server).await;

        // A token is already cached (warmed once, up front) before the
        // scenario's own 401/retry exchange begins.
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "stale-token",
                "expires_in": 3600,
            })))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fresh-token",
                "expires_in": 3600,
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/instances"))
            .and(header("authorization", "Bearer stale-token"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/instances"))
            .and(header("authorization", "Bearer fresh-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": page_of(1, None),
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = test_client();
        // Warm the cache with the stale token before the scenario's own
        // GET, so the retry's acquisition is the only one the mocks count.
        let token = client.tokens.get("dev", &config).await.unwrap();
        assert_eq!(token, "stale-token");

        let result = client
            .get_paginated(
                "monitoringInstances",
                &format!("{}/instances", mock_server.uri()),
                PaginatedQuery::default(),
                "dev",
                &config,
            )
            .await
            .expect("retry should succeed");

        assert_eq!(result.items.len(), 1);
        mock_server.verify().await;
    }
}
