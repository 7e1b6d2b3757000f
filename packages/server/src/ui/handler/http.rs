//! Admin HTTP API endpoint handlers (read-only).

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{HistoryDto, UsersDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get registered usernames
pub async fn get_users(State(state): State<Arc<AppState>>) -> Json<UsersDto> {
    let usernames = state.registry.usernames().await;

    Json(UsersDto {
        count: usernames.len(),
        usernames,
    })
}

/// Get the lines a newcomer would be replayed
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistoryDto> {
    Json(HistoryDto {
        capacity: state.history.capacity(),
        lines: state.history.snapshot().await,
    })
}
