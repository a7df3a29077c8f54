// src/services/user_service.rs
use async_trait::async_trait;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{AppError, AppResult},
    models::user::UserRecord,
    services::{
        cache_service::{Cache, CacheKeys, CacheOperations},
        user_client::UserFetcher,
    },
};

#[async_trait]
pub trait UserOperations: Send + Sync {
    async fn get_user(&self, user_id: &str) -> AppResult<UserRecord>;
}

/// Read-through user lookup: cached records are served directly, misses are
/// fetched, stored and returned. Failed fetches are never stored.
pub struct UserService<C = Cache> {
    cache: Arc<C>,
    fetcher: Arc<dyn UserFetcher>,
    ttl_seconds: Option<u64>,
}

impl<C> UserService<C>
where
    C: CacheOperations<UserRecord>,
{
    pub fn new(cache: Arc<C>, fetcher: Arc<dyn UserFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            ttl_seconds: None,
        }
    }

    /// Overrides the store's default TTL for user entries.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }
}

#[async_trait]
impl<C> UserOperations for UserService<C>
where
    C: CacheOperations<UserRecord>,
{
    async fn get_user(&self, user_id: &str) -> AppResult<UserRecord> {
        if user_id.is_empty() {
            return Err(AppError::invalid_user_id(user_id));
        }

        tracing::debug!("Getting user: {}", user_id);

        let key = CacheKeys::user_by_id(user_id);
        self.cache
            .get_or_set(&key, self.ttl_seconds, || self.fetcher.fetch(user_id))
            .await
    }
}
