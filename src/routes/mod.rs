//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One websocket endpoint carries the stroke protocol. Two small HTTP
//! endpoints sit beside it: a liveness check that reports how many
//! participants are connected, and a read-only dump of the
//! stroke log in the same shape as the `history` frame.

pub mod ws;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::frame::Frame;
use crate::services;
use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/history", get(history))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn history(State(state): State<AppState>) -> Json<Frame> {
    Json(Frame::history(services::stroke::snapshot_history(&state).await))
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let clients = services::session::connected_count(&state).await;
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok", "clients": clients })))
}
