// src/handlers/mod.rs
pub mod user_handler;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{services::user_client::USERS_PATH, state::AppState};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&format!("{}/:id", USERS_PATH), get(user_handler::get_user))
        .route("/health", get(user_handler::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
