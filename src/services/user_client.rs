// src/services/user_client.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing;

use crate::{
    config::ConfigProvider,
    errors::{AppError, AppResult},
    models::user::UserRecord,
};

pub const USERS_PATH: &str = "/api/v1/users";

/// Source of user records for the cache to fill from.
#[async_trait]
pub trait UserFetcher: Send + Sync {
    async fn fetch(&self, user_id: &str) -> AppResult<UserRecord>;
}

/// Looks users up on the remote user service, one request per call.
pub struct RemoteUserFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteUserFetcher {
    pub fn new(config: &impl ConfigProvider) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_client(client, config.user_service_url()))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{base_url}/api/v1/users/{user_id}` with the ID percent-encoded as one path segment.
    pub fn user_url(&self, user_id: &str) -> AppResult<reqwest::Url> {
        let invalid = |reason: String| AppError::HttpClient(format!("invalid user service URL {}: {}", self.base_url, reason));

        let mut url = reqwest::Url::parse(&format!("{}{}", self.base_url, USERS_PATH))
            .map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot be a base".to_string()))?
            .push(user_id);

        Ok(url)
    }
}

#[async_trait]
impl UserFetcher for RemoteUserFetcher {
    async fn fetch(&self, user_id: &str) -> AppResult<UserRecord> {
        if user_id.is_empty() {
            return Err(AppError::invalid_user_id(user_id));
        }

        let url = self.user_url(user_id)?;
        tracing::info!("Requesting user {} from {}", user_id, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            tracing::warn!("User service returned {} for user {}", status, user_id);
            return Err(AppError::remote_request(status.as_u16()));
        }

        let user = response.json::<UserRecord>().await?;
        tracing::debug!("Fetched user {}", user.id);

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_trims_trailing_slash() {
        let fetcher = RemoteUserFetcher::with_client(reqwest::Client::new(), "http://localhost:1080/");
        assert_eq!(
            fetcher.user_url("5fe0cce861c8ea54018385ae").unwrap().as_str(),
            "http://localhost:1080/api/v1/users/5fe0cce861c8ea54018385ae"
        );
    }

    #[test]
    fn test_user_url_encodes_id_as_one_segment() {
        let fetcher = RemoteUserFetcher::with_client(reqwest::Client::new(), "http://localhost:1080");
        let url = fetcher.user_url("a/b?c#d").unwrap();
        assert_eq!(url.as_str(), "http://localhost:1080/api/v1/users/a%2Fb%3Fc%23d");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_unparseable_base_url_is_reported() {
        let fetcher = RemoteUserFetcher::with_client(reqwest::Client::new(), "not a url");
        assert!(matches!(fetcher.user_url("42"), Err(AppError::HttpClient(_))));
    }

    #[tokio::test]
    async fn test_empty_id_is_rejected_before_request() {
        // Nothing listens on port 9; an attempted request would surface as a network error
        let fetcher = RemoteUserFetcher::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        let err = fetcher.fetch("").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUserId(_)));
    }
}
