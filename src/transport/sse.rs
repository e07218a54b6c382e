//! Transport A — legacy event-stream push (spec.md §4.1). `GET /sse` opens
//! a long-lived stream; `POST /messages` submits a JSON-RPC request whose
//! reply is delivered on the most recently opened stream. Grounded on
//! `ratchet-mcp::server::mod::McpServer::create_sse_routes`.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::server::GatewayState;

pub fn routes() -> Router<GatewayState> {
    Router::new()
        .route("/sse", get(open_stream))
        .route("/messages", post(post_message))
}

async fn open_stream(
    State(state): State<GatewayState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = state.sessions.create(tx).await;
    debug!(session_id = %session.id, "opened SSE push session");

    let stream = async_stream::stream! {
        while let Some(data) = rx.recv().await {
            yield Ok(Event::default().data(data));
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    )
}

async fn post_message(
    State(state): State<GatewayState>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let request: JsonRpcRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(err) => {
            let response = JsonRpcResponse::error(JsonRpcError::parse_error(err.to_string()), None);
            return Json(serde_json::to_value(response).unwrap_or(Value::Null));
        }
    };

    let response = state.dispatcher.handle_message(request).await;

    if let Some(session) = state.sessions.most_recent().await {
        if let Some(response) = &response {
            session.record_response_id(response.id.clone()).await;
            match serde_json::to_string(response) {
                Ok(body) => {
                    if session.sender.send(body).is_err() {
                        warn!(session_id = %session.id, "SSE push session no longer receiving");
                    }
                }
                Err(err) => warn!(error = %err, "failed to serialize SSE response"),
            }
        }
    }

    Json(json_ack(response.is_some()))
}

fn json_ack(has_response: bool) -> Value {
    if has_response {
        serde_json::json!({"status": "sent"})
    } else {
        serde_json::json!({"status": "processed"})
    }
}
