//! HTTP API endpoints for read-only snapshots.
//!
//! The WebSocket carries the realtime flow. These endpoints serve clients
//! that only need a one-off look at a room, plus debugging.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::engine::GameService;
use crate::projection::room_view;

/// Snapshot of one room.
///
/// GET /api/rooms/{room_id}/state
pub async fn get_room_state(
    State(service): State<Arc<GameService>>,
    Path(room_id): Path<String>,
) -> Response {
    match room_view(service.store().as_ref(), &room_id).await {
        Ok(Some(view)) => Json(view).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "room not found").into_response(),
        Err(e) => {
            tracing::error!("Room snapshot failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "snapshot failed").into_response()
        }
    }
}

/// List the word categories rounds draw from.
///
/// GET /api/categories
pub async fn list_categories(State(service): State<Arc<GameService>>) -> Response {
    match service.store().categories().await {
        Ok(categories) => Json(categories).into_response(),
        Err(e) => {
            tracing::error!("Category listing failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "listing failed").into_response()
        }
    }
}
