use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, Session};
use crate::services::ai::chain::ChainStats;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/status
#[derive(Serialize)]
pub struct StatusResponse {
    clinic: String,
    providers: Vec<String>,
    chain: ChainStats,
    active_sessions: i64,
}

pub async fn get_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let active_sessions = state.store.with_conn(queries::count_active_sessions)?;

    Ok(Json(StatusResponse {
        clinic: state.engine.profile().clinic_info.name.clone(),
        providers: state.chain.labels().into_iter().map(String::from).collect(),
        chain: state.chain.stats(),
        active_sessions,
    }))
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let bookings = state
        .store
        .with_conn(|conn| queries::get_bookings(conn, limit))?;

    Ok(Json(bookings))
}

// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    Ok(Json(state.engine.session(&id).await))
}

// POST /api/sessions/:id/reset
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let session = state.engine.reset(&id).await?;
    tracing::info!(phone = %id, "session reset by admin");
    Ok(Json(session))
}
