// src/handlers/user_handler.rs
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::{errors::AppResult, models::user::UserRecord, state::AppState};

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> AppResult<Json<UserRecord>> {
    let user = state.user_service.get_user(&user_id).await?;
    Ok(Json(user))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cache": state.cache_backend,
    }))
}
