//! End-to-end HTTP surface tests: the merged router's plain routes and the
//! `/stream` transport's JSON-RPC dispatch, exercised with `tower::oneshot`
//! rather than a bound socket (grounded on
//! `ratchet-error-middleware/tests/integration_tests.rs`'s oneshot style).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use oic_mcp_gateway::config::TenantRegistry;
use oic_mcp_gateway::{build_router, GatewayState};

fn test_app() -> axum::Router {
    let state = GatewayState::new(TenantRegistry::from_env(), reqwest::Client::new());
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn identity_endpoint_reports_full_catalog_size() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["tool_count"], 24);
}

#[tokio::test]
async fn stream_post_lists_the_tool_catalog() {
    let app = test_app();
    let request_body = json!({
        "jsonrpc": "2.0",
        "method": "tools/list",
        "id": 1,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stream")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let tools = body["result"]["tools"].as_array().expect("tools array");
    assert_eq!(tools.len(), 24);
    assert!(tools.iter().all(|t| t["inputSchema"]["required"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "tenant")));
}

#[tokio::test]
async fn stream_post_unknown_tool_is_mcp_error_content_not_jsonrpc_error() {
    let app = test_app();
    let request_body = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {"name": "doesNotExist", "arguments": {}},
        "id": 2,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stream")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body.get("error").is_none(), "unknown tool must not be a JSON-RPC error");
    assert_eq!(body["result"]["isError"], true);
}

#[tokio::test]
async fn stream_post_bulk_size_violation_is_rejected_before_any_upstream_traffic() {
    let app = test_app();
    let ids: Vec<String> = (0..51).map(|i| i.to_string()).collect();
    let request_body = json!({
        "jsonrpc": "2.0",
        "method": "tools/call",
        "params": {
            "name": "monitoringResubmitErroredInstances",
            "arguments": {"tenant": "dev", "instanceIds": ids},
        },
        "id": 3,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stream")
                .header("content-type", "application/json")
                .body(Body::from(request_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"]["isError"], true);
    let message = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(message.contains("Invalid arguments"));
}

#[tokio::test]
async fn delete_on_stream_without_session_header_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().method("DELETE").uri("/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
