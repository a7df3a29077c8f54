use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use user_lookup::{
    config::AppConfig,
    errors::{AppError, AppResult},
    handlers,
    state::AppState,
};

#[tokio::main]
async fn main() -> AppResult<()> {
    // A missing .env is fine; anything else is worth a warning
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;
    let app = handlers::router(Arc::new(app_state));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::ConfigurationError(format!("cannot bind {}: {}", bind_addr, e)))?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::ConfigurationError(format!("server error: {}", e)))
}
