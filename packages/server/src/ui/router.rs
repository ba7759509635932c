//! Route table.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use super::{handler, state::AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(handler::websocket_handler))
        .route("/login", get(handler::login))
        .route("/callback", get(handler::callback))
        .route("/api/health", get(handler::health_check))
        .route("/api/rooms", get(handler::get_rooms))
        .route("/api/rooms/{room_id}", get(handler::get_room_detail))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
