//! Transport B — the preferred bidirectional HTTP transport (spec.md
//! §4.1): a single `/stream` endpoint. `GET` opens a server-push
//! notification channel, `POST` submits a JSON-RPC request and gets its
//! response inlined, `DELETE` terminates the session. Sessions are
//! identified by a server-issued id carried in the `mcp-session-id` header
//! both ways. Grounded on
//! `axum-mcp::transport::streamable_http` / `ratchet-mcp`'s unified
//! `mcp_endpoint_handler`.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::GatewayState;

const SESSION_HEADER: &str = "mcp-session-id";

pub fn routes() -> Router<GatewayState> {
    Router::new().route(
        "/stream",
        get(open_channel).post(submit_request).delete(terminate_session),
    )
}

async fn open_channel(
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = state.sessions.create(tx).await;
    let session_id = session.id.clone();
    debug!(session_id = %session_id, "opened streamable-http push channel");

    let stream = async_stream::stream! {
        while let Some(data) = rx.recv().await {
            yield Ok::<_, Infallible>(Event::default().data(data));
        }
    };

    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    );

    let mut response = sse.into_response();
    if let Ok(value) = session_id.parse() {
        response.headers_mut().insert(
            HeaderName::from_static(SESSION_HEADER),
            value,
        );
    }
    response
}

async fn submit_request(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            let response = JsonRpcResponse::error(JsonRpcError::parse_error(err.to_string()), None);
            return Json(serde_json::to_value(response).unwrap_or(Value::Null)).into_response();
        }
    };

    let response = state.dispatcher.handle_message(request).await;

    // When the caller names a session, correlate and also fan the reply out
    // over its push channel; either way the response is inlined in the
    // POST body too, matching "small and synchronous" responses inline.
    if let Some(session_id) = headers.get(SESSION_HEADER).and_then(|h| h.to_str().ok()) {
        if let Some(session) = state.sessions.get(session_id).await {
            if let Some(response) = &response {
                session.record_response_id(response.id.clone()).await;
                if let Ok(body) = serde_json::to_string(response) {
                    if session.sender.send(body).is_err() {
                        warn!(session_id, "streamable-http push channel no longer receiving");
                    }
                }
            }
        }
    }

    match response {
        Some(response) => Json(serde_json::to_value(response).unwrap_or(Value::Null)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn terminate_session(State(state): State<GatewayState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(session_id) = headers.get(SESSION_HEADER).and_then(|h| h.to_str().ok()) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.sessions.remove(session_id).await {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
