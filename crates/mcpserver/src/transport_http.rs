use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::server::Server;
use crate::types::JsonRpcRequest;

const SESSION_HEADER: &str = "mcp-session-id";

/// Create an Axum router serving the streamable HTTP transport.
///
/// Sessions are not tracked: a fresh `mcp-session-id` is issued on
/// `initialize` and whatever id the client sends afterwards is echoed back.
pub fn http_router(server: Server) -> Router {
    let state = Arc::new(server);

    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

async fn handle_healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn handle_mcp(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    Json(req): Json<JsonRpcRequest>,
) -> Response {
    let session_id = if req.method == "initialize" {
        Some(Uuid::new_v4().to_string())
    } else {
        headers
            .get(SESSION_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(|id| id.to_string())
    };

    let resp = server.handle(req).await;

    if resp.is_notification() {
        return (StatusCode::ACCEPTED, Body::empty()).into_response();
    }

    let mut response = Json(&resp).into_response();

    if let Some(value) = session_id.and_then(|sid| HeaderValue::from_str(&sid).ok()) {
        response.headers_mut().insert(SESSION_HEADER, value);
    }

    response
}
