//! API layer - HTTP and WebSocket entry points.

pub mod connections;
pub mod http;
pub mod websocket;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub use connections::{ConnectionError, ConnectionInfo, ConnectionManager};
use websocket::{ws_handler, WsState};

/// Full router: HTTP routes plus `/ws`, with request tracing.
pub fn router(ws_state: Arc<WsState>) -> Router {
    http::routes()
        .with_state(ws_state.app.clone())
        .route("/ws", get(ws_handler).with_state(ws_state))
        .layer(TraceLayer::new_for_http())
}
