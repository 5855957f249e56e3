//! HTTP routes.

use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

use plaza_shared::RoomListResponse;

use crate::app::App;
use crate::use_cases::RoomError;

/// Most rooms listed by the directory endpoint.
pub const ROOM_LIST_LIMIT: usize = 10;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/v1/rooms", get(list_rooms))
}

async fn health() -> &'static str {
    "OK"
}

async fn list_rooms(State(app): State<Arc<App>>) -> Result<Json<RoomListResponse>, ApiError> {
    let rooms = app
        .use_cases
        .room
        .list_rooms
        .execute(ROOM_LIST_LIMIT)
        .await?;
    Ok(Json(RoomListResponse { rooms }))
}

#[derive(Debug)]
pub enum ApiError {
    Unavailable(String),
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Unavailable(msg) => {
                tracing::warn!(error = %msg, "Store unavailable");
                (
                    axum::http::StatusCode::SERVICE_UNAVAILABLE,
                    "Service unavailable",
                )
                    .into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error",
                )
                    .into_response()
            }
        }
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::Store(store) if !store.is_not_found() => {
                ApiError::Unavailable(store.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
