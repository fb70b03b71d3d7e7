pub mod admin;
pub mod chat;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/message", post(chat::send_message))
        .route("/api/status", get(admin::get_status))
        .route("/api/bookings", get(admin::get_bookings))
        .route("/api/sessions/:id", get(admin::get_session))
        .route("/api/sessions/:id/reset", post(admin::reset_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
