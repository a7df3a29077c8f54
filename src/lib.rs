pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use config::{AppConfig, ConfigProvider};
pub use errors::{AppError, AppResult};
pub use models::user::UserRecord;
pub use services::{
    cache_service::{Cache, CacheOperations, MemoryCache, RedisCache},
    user_client::{RemoteUserFetcher, UserFetcher},
    user_service::{UserOperations, UserService},
};
