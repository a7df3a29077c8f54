// src/services/cache_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing;

/// Longest TTL a cache entry may carry, ten years.
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 3600;

// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl_seconds: u64,
    pub redis_url: String,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: 3600, // 1 hour
            redis_url: "redis://127.0.0.1:6379".to_string(),
            enabled: true,
        }
    }
}

impl CacheConfig {
    /// Seconds until expiry for a write, or `None` for no expiry.
    fn effective_ttl(&self, ttl: Option<u64>) -> Option<u64> {
        Some(ttl.unwrap_or(self.default_ttl_seconds)).filter(|seconds| *seconds > 0)
    }
}

// Cache key strategies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Simple(String),
    Composite(Vec<String>),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Simple(key) => f.write_str(key),
            CacheKey::Composite(parts) => f.write_str(&parts.join(":")),
        }
    }
}

/// Key generators for cached resources
pub struct CacheKeys;

impl CacheKeys {
    pub fn user_by_id(user_id: &str) -> CacheKey {
        CacheKey::Composite(vec!["user".to_string(), "id".to_string(), user_id.to_string()])
    }
}

// Error types
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Operation error: {0}")]
    OperationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Cache is disabled")]
    CacheDisabled,
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
            CacheError::ConnectionError(err.to_string())
        } else {
            CacheError::OperationError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::SerializationError(err.to_string())
    }
}

/// Typed access to a key/value store.
///
/// `get_or_set` is the read-through primitive: on a hit the producer is never
/// called, on a miss its value is stored and returned. Producer errors come
/// back as-is and nothing is stored for them. Store failures are converted
/// into the producer's error type.
#[async_trait]
pub trait CacheOperations<T>: Send + Sync
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError>;
    async fn set(&self, key: &CacheKey, value: &T, ttl: Option<u64>) -> Result<(), CacheError>;
    async fn get_or_set<E, F, Fut>(&self, key: &CacheKey, ttl: Option<u64>, producer: F) -> Result<T, E>
    where
        E: From<CacheError> + Send + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send;
}

/// Per-key locks held across a check-fetch-store sequence so that concurrent
/// misses on one key run the producer once.
#[derive(Default)]
pub struct InFlight {
    slots: StdMutex<HashMap<String, Slot>>,
}

struct Slot {
    lock: Arc<Mutex<()>>,
    // Holders plus queued waiters; the slot is dropped from the map at zero
    users: usize,
}

/// Registration on a key's slot, released on drop whether or not the lock was won.
struct SlotTicket<'a> {
    owner: &'a InFlight,
    key: String,
}

pub struct InFlightGuard<'a> {
    _lock: OwnedMutexGuard<()>,
    _ticket: SlotTicket<'a>,
}

impl InFlight {
    pub async fn acquire(&self, key: &str) -> InFlightGuard<'_> {
        let (ticket, lock) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.to_string()).or_insert_with(|| Slot {
                lock: Arc::new(Mutex::new(())),
                users: 0,
            });
            slot.users += 1;
            let ticket = SlotTicket {
                owner: self,
                key: key.to_string(),
            };
            (ticket, slot.lock.clone())
        };
        let lock = lock.lock_owned().await;

        InFlightGuard {
            _lock: lock,
            _ticket: ticket,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for SlotTicket<'_> {
    fn drop(&mut self) {
        let mut slots = self.owner.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users -= 1;
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}

async fn read_through<S, T, E, F, Fut>(
    store: &S,
    inflight: &InFlight,
    key: &CacheKey,
    ttl: Option<u64>,
    producer: F,
) -> Result<T, E>
where
    S: CacheOperations<T> + ?Sized,
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    E: From<CacheError> + Send + 'static,
    F: FnOnce() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
{
    let key_str = key.to_string();

    if let Some(cached) = store.get(key).await? {
        tracing::debug!("Cache hit for key: {}", key_str);
        return Ok(cached);
    }

    let _slot = inflight.acquire(&key_str).await;

    // Another caller may have filled the entry while we waited for the slot
    if let Some(cached) = store.get(key).await? {
        tracing::debug!("Cache filled while waiting for key: {}", key_str);
        return Ok(cached);
    }

    tracing::debug!("Cache miss for key: {}, executing producer", key_str);
    let value = producer().await?;
    store.set(key, &value, ttl).await?;
    Ok(value)
}

// Redis-based cache implementation
pub struct RedisCache {
    client: Client,
    config: CacheConfig,
    inflight: InFlight,
}

impl RedisCache {
    pub async fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.clone())
            .map_err(|e| CacheError::ConnectionError(e.to_string()))?;

        let instance = Self {
            client,
            config,
            inflight: InFlight::default(),
        };

        // Fail at startup rather than on the first lookup
        instance.get_connection().await?;
        Ok(instance)
    }

    async fn get_connection(&self) -> Result<redis::aio::Connection, CacheError> {
        self.client
            .get_async_connection()
            .await
            .map_err(|e| CacheError::ConnectionError(e.to_string()))
    }
}

/// `SET key value [EX seconds]`
fn set_command(key: &CacheKey, json: String, ttl_seconds: Option<u64>) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key.to_string()).arg(json);
    if let Some(seconds) = ttl_seconds {
        cmd.arg("EX").arg(seconds);
    }
    cmd
}

#[async_trait]
impl<T> CacheOperations<T> for RedisCache
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        if !self.config.enabled {
            return Err(CacheError::CacheDisabled);
        }

        let mut conn = self.get_connection().await?;
        let data: Option<String> = redis::cmd("GET")
            .arg(key.to_string())
            .query_async(&mut conn)
            .await?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &T, ttl: Option<u64>) -> Result<(), CacheError> {
        if !self.config.enabled {
            return Err(CacheError::CacheDisabled);
        }

        let json = serde_json::to_string(value)?;
        let mut conn = self.get_connection().await?;

        let cmd = set_command(key, json, self.config.effective_ttl(ttl));
        let _: () = cmd.query_async(&mut conn).await?;

        Ok(())
    }

    async fn get_or_set<E, F, Fut>(&self, key: &CacheKey, ttl: Option<u64>, producer: F) -> Result<T, E>
    where
        E: From<CacheError> + Send + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        if !self.config.enabled {
            return producer().await;
        }
        read_through(self, &self.inflight, key, ttl, producer).await
    }
}

// Memory cache, the default when no Redis URL is configured
pub struct MemoryCache {
    store: RwLock<HashMap<String, (String, Option<DateTime<Utc>>)>>,
    config: CacheConfig,
    inflight: InFlight,
}

impl MemoryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            config,
            inflight: InFlight::default(),
        }
    }

    fn is_expired(expires_at: Option<DateTime<Utc>>) -> bool {
        match expires_at {
            Some(expiry) => Utc::now() > expiry,
            None => false,
        }
    }

    fn expiry_after(seconds: u64) -> Result<DateTime<Utc>, CacheError> {
        i64::try_from(seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| CacheError::OperationError(format!("TTL of {} seconds is out of range", seconds)))
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<T> CacheOperations<T> for MemoryCache
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        if !self.config.enabled {
            return Err(CacheError::CacheDisabled);
        }

        let key_str = key.to_string();
        {
            let store = self.store.read().await;
            match store.get(&key_str) {
                Some((_, expiry)) if Self::is_expired(*expiry) => {}
                Some((json, _)) => return Ok(Some(serde_json::from_str(json)?)),
                None => return Ok(None),
            }
        }

        // Expired: evict, unless a writer refreshed it in the meantime
        let mut store = self.store.write().await;
        if store.get(&key_str).is_some_and(|(_, expiry)| Self::is_expired(*expiry)) {
            store.remove(&key_str);
        }
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: &T, ttl: Option<u64>) -> Result<(), CacheError> {
        if !self.config.enabled {
            return Err(CacheError::CacheDisabled);
        }

        let json = serde_json::to_string(value)?;
        let expires_at = self
            .config
            .effective_ttl(ttl)
            .map(Self::expiry_after)
            .transpose()?;

        let mut store = self.store.write().await;
        // Entries that expired without being read again would otherwise stay forever
        store.retain(|_, (_, expiry)| !Self::is_expired(*expiry));
        store.insert(key.to_string(), (json, expires_at));

        Ok(())
    }

    async fn get_or_set<E, F, Fut>(&self, key: &CacheKey, ttl: Option<u64>, producer: F) -> Result<T, E>
    where
        E: From<CacheError> + Send + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        if !self.config.enabled {
            return producer().await;
        }
        read_through(self, &self.inflight, key, ttl, producer).await
    }
}

// Enum to wrap different cache implementations
pub enum Cache {
    Redis(RedisCache),
    Memory(MemoryCache),
}

impl Cache {
    /// Redis when a URL is given, memory otherwise.
    pub async fn connect(redis_url: Option<&str>, ttl_seconds: u64) -> Result<Self, CacheError> {
        let mut config = CacheConfig {
            default_ttl_seconds: ttl_seconds,
            ..Default::default()
        };

        match redis_url {
            Some(url) => {
                config.redis_url = url.to_string();
                tracing::info!("Using Redis cache at {}", url);
                Ok(Cache::Redis(RedisCache::new(config).await?))
            }
            None => {
                tracing::info!("REDIS_URL not set, using in-memory cache");
                Ok(Cache::Memory(MemoryCache::new(config)))
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Cache::Redis(_) => "redis",
            Cache::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl<T> CacheOperations<T> for Cache
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        match self {
            Cache::Redis(cache) => cache.get(key).await,
            Cache::Memory(cache) => cache.get(key).await,
        }
    }

    async fn set(&self, key: &CacheKey, value: &T, ttl: Option<u64>) -> Result<(), CacheError> {
        match self {
            Cache::Redis(cache) => cache.set(key, value, ttl).await,
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn get_or_set<E, F, Fut>(&self, key: &CacheKey, ttl: Option<u64>, producer: F) -> Result<T, E>
    where
        E: From<CacheError> + Send + 'static,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        match self {
            Cache::Redis(cache) => cache.get_or_set(key, ttl, producer).await,
            Cache::Memory(cache) => cache.get_or_set(key, ttl, producer).await,
        }
    }
}
