use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::conversation::TurnReply;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IncomingMessage {
    pub from: String,
    pub message: String,
}

// POST /api/message
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IncomingMessage>,
) -> Result<Json<TurnReply>, AppError> {
    let from = payload.from.trim();
    let body = payload.message.trim();

    if from.is_empty() {
        return Err(AppError::BadRequest("'from' must not be empty".to_string()));
    }
    if body.is_empty() {
        return Err(AppError::BadRequest("'message' must not be empty".to_string()));
    }

    let turn = state.engine.process_message(from, body).await?;
    Ok(Json(turn))
}
