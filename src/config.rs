// src/config.rs
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, AppResult};
use crate::services::cache_service::MAX_TTL_SECONDS;

pub const DEFAULT_USER_SERVICE_URL: &str = "http://localhost:1080";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Settings the remote user client needs.
pub trait ConfigProvider: Send + Sync {
    /// Base address of the remote user service, e.g. `http://localhost:1080`.
    fn user_service_url(&self) -> &str;

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub user_service_url: String,
    pub request_timeout_secs: u64,
    pub redis_url: Option<String>,
    pub cache_ttl_seconds: u64,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_service_url: DEFAULT_USER_SERVICE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            redis_url: None,
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// Reads settings from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            user_service_url: get("USER_SERVICE_URL").unwrap_or(defaults.user_service_url),
            request_timeout_secs: parse_or("USER_SERVICE_TIMEOUT_SECS", get("USER_SERVICE_TIMEOUT_SECS"), defaults.request_timeout_secs)?,
            redis_url: get("REDIS_URL"),
            cache_ttl_seconds: parse_or("USER_CACHE_TTL_SECS", get("USER_CACHE_TTL_SECS"), defaults.cache_ttl_seconds)?,
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        if !(self.user_service_url.starts_with("http://") || self.user_service_url.starts_with("https://")) {
            return Err(AppError::invalid_configuration(
                "USER_SERVICE_URL",
                &self.user_service_url,
                "must start with http:// or https://",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(AppError::invalid_configuration(
                "USER_SERVICE_TIMEOUT_SECS",
                "0",
                "must be greater than zero",
            ));
        }
        if self.cache_ttl_seconds > MAX_TTL_SECONDS {
            return Err(AppError::invalid_configuration(
                "USER_CACHE_TTL_SECS",
                self.cache_ttl_seconds.to_string(),
                format!("must be at most {}", MAX_TTL_SECONDS),
            ));
        }
        Ok(())
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> AppResult<T> {
    match raw {
        Some(value) => value
            .parse()
            .map_err(|_| AppError::invalid_configuration(key, &value, "expected a non-negative integer")),
        None => Ok(default),
    }
}

impl ConfigProvider for AppConfig {
    fn user_service_url(&self) -> &str {
        &self.user_service_url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
