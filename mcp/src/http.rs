use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cms_mcp_runtime::McpServer;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

const MCP_PATH: &str = "/mcp";

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route(MCP_PATH, post(mcp_post).get(mcp_get))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn mcp_get() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

async fn mcp_post(State(server): State<Arc<McpServer>>, body: Bytes) -> Response {
    let incoming: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::OK,
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": -32700,
                        "message": "Parse error"
                    }
                })),
            )
                .into_response();
        }
    };

    let is_batch = incoming.is_array();
    let mut responses = server.handle_incoming_message(incoming).await;

    if responses.is_empty() {
        return StatusCode::ACCEPTED.into_response();
    }

    if responses.len() == 1 && !is_batch {
        return (StatusCode::OK, Json(responses.remove(0))).into_response();
    }

    (StatusCode::OK, Json(Value::Array(responses))).into_response()
}
