// src/state.rs
use std::sync::Arc;

use crate::{
    config::AppConfig,
    errors::AppResult,
    services::{
        cache_service::Cache,
        user_client::RemoteUserFetcher,
        user_service::{UserOperations, UserService},
    },
};

pub struct AppState {
    pub user_service: Arc<dyn UserOperations>,
    pub cache_backend: &'static str,
}

impl AppState {
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        let cache = Arc::new(Cache::connect(config.redis_url.as_deref(), config.cache_ttl_seconds).await?);
        let cache_backend = cache.backend();
        let fetcher = Arc::new(RemoteUserFetcher::new(&config)?);
        let user_service: Arc<dyn UserOperations> = Arc::new(UserService::new(cache, fetcher));

        tracing::info!(
            "User service at {}, cache backend {}",
            config.user_service_url,
            cache_backend
        );

        Ok(Self::with_service(user_service, cache_backend))
    }

    pub fn with_service(
        user_service: Arc<dyn UserOperations>,
        cache_backend: &'static str,
    ) -> Self {
        Self {
            user_service,
            cache_backend,
        }
    }
}
