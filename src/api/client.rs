//! Authenticated HTTP client for the rmon backend

use crate::api::types::{AccessToken, AccountDetails, ErrorMessage, LoginRequest, RefreshRequest, TokenPair};
use crate::config::ApiConfig;
use crate::costs::{CostHistory, LatestCost};
use crate::error::{Result, RmonError};
use crate::global::{IamUser, S3Bucket};
use crate::resources::region::RegionSummary;
use crate::resources::types::ResourceCatalog;
use crate::retry::ExponentialBackoffPolicy;
use crate::session::{token_expired, Session, SessionStore};
use chrono::{NaiveDate, Utc};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub const TOKEN_PATH: &str = "/api/token/";
pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh/";
pub const ALL_RESOURCES_PATH: &str = "/api/rmon/all-resources/";
pub const REGIONS_PATH: &str = "/api/rmon/resource-per-region/";
pub const ACCOUNT_DETAILS_PATH: &str = "/api/rmon/account-details/";
pub const LATEST_COST_PATH: &str = "/api/rmon/latest-cumulative-cost/";
pub const COST_RANGE_PATH: &str = "/api/rmon/cumulative-cost-range/";
pub const IAM_USERS_PATH: &str = "/api/rmon/iam-users/";
pub const S3_BUCKETS_PATH: &str = "/api/rmon/s3-buckets/";

const NOT_LOGGED_IN: &str = "not logged in; run `rmon login`";
const SESSION_EXPIRED: &str = "session expired; run `rmon login` again";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
    session: Mutex<Option<Session>>,
    retry: ExponentialBackoffPolicy,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, store: SessionStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let session = store.load()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            session: Mutex::new(session),
            retry: ExponentialBackoffPolicy::new(config.max_retries),
        })
    }

    pub fn with_retry_policy(mut self, retry: ExponentialBackoffPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a token pair and persist it
    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(RmonError::Auth("Invalid username or password".to_string()));
        }
        let tokens: TokenPair = Self::decode(response).await?;
        let session = Session {
            access: tokens.access,
            refresh: tokens.refresh,
        };
        self.store.save(&session)?;
        *self.session.lock().await = Some(session.clone());
        info!("Logged in as {}", username);
        Ok(session)
    }

    /// Forget stored tokens; returns whether any were present
    pub async fn logout(&self) -> Result<bool> {
        *self.session.lock().await = None;
        self.store.clear()
    }

    /// Obtain a new access token from the refresh token
    pub async fn refresh(&self) -> Result<String> {
        let mut guard = self.session.lock().await;
        let refresh = match guard.as_ref() {
            Some(session) => session.refresh.clone(),
            None => return Err(RmonError::Auth(NOT_LOGGED_IN.to_string())),
        };

        debug!("Refreshing access token");
        let response = self
            .http
            .post(self.url(TOKEN_REFRESH_PATH))
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await?;
        if !response.status().is_success() {
            debug!("Token refresh rejected with HTTP {}", response.status());
            return Err(RmonError::Auth(SESSION_EXPIRED.to_string()));
        }
        let token: AccessToken = Self::decode(response).await?;

        let session = Session {
            access: token.access.clone(),
            refresh,
        };
        self.store.save(&session)?;
        *guard = Some(session);
        Ok(token.access)
    }

    /// Current access token, refreshed first when its `exp` has passed
    async fn access_token(&self) -> Result<String> {
        let access = match self.session.lock().await.as_ref() {
            Some(session) => session.access.clone(),
            None => return Err(RmonError::Auth(NOT_LOGGED_IN.to_string())),
        };
        if token_expired(&access, Utc::now().timestamp()) {
            debug!("Access token expired");
            return self.refresh().await;
        }
        Ok(access)
    }

    async fn send_get(&self, path: &str, query: &[(&str, String)], token: &str) -> Result<Response> {
        Ok(self
            .http
            .get(self.url(path))
            .query(query)
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// GET with bearer auth; a 401 triggers one refresh and one retry
    async fn send_authorized(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let token = self.access_token().await?;
        let response = self.send_get(path, query, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!("{} returned 401, refreshing once", path);
        let token = self.refresh().await?;
        let response = self.send_get(path, query, &token).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(RmonError::Auth(SESSION_EXPIRED.to_string()));
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorMessage>(&body)
                .map(|m| m.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(RmonError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    /// Authorized GET decoded as JSON, retried on transient failures
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.retry
            .execute_with_retry(|| async move {
                let response = self.send_authorized(path, &[]).await?;
                Self::decode(response).await
            })
            .await
    }

    pub async fn fetch_catalog(&self) -> Result<ResourceCatalog> {
        let body: Value = self
            .get_json(ALL_RESOURCES_PATH)
            .await
            .map_err(|e| source_error("all-resources", e))?;
        ResourceCatalog::from_json(body)
    }

    pub async fn fetch_regions(&self) -> Result<Vec<RegionSummary>> {
        self.get_json(REGIONS_PATH)
            .await
            .map_err(|e| source_error("resource-per-region", e))
    }

    /// First entry of the account-details list
    pub async fn account_details(&self) -> Result<AccountDetails> {
        let details: Vec<AccountDetails> = self.get_json(ACCOUNT_DETAILS_PATH).await?;
        details
            .into_iter()
            .next()
            .ok_or_else(|| RmonError::unavailable("account-details", "no account details returned"))
    }

    pub async fn latest_cost(&self) -> Result<LatestCost> {
        let body: Value = self.get_json(LATEST_COST_PATH).await?;
        LatestCost::from_json(body)
    }

    /// Cost series for a date range; a 404 means "no data" and carries the server message
    pub async fn cost_history(&self, start: NaiveDate, end: NaiveDate) -> Result<CostHistory> {
        let query = [
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
        ];
        let query = &query;
        let result = self
            .retry
            .execute_with_retry(|| async move {
                let response = self.send_authorized(COST_RANGE_PATH, query).await?;
                if response.status() == StatusCode::NOT_FOUND {
                    let message: ErrorMessage = response.json().await.unwrap_or_default();
                    return Ok(CostHistory::no_data(message.message));
                }
                let body: Value = Self::decode(response).await?;
                CostHistory::from_json(body)
            })
            .await?;
        Ok(result)
    }

    pub async fn iam_users(&self) -> Result<Vec<IamUser>> {
        self.get_json(IAM_USERS_PATH).await
    }

    pub async fn s3_buckets(&self) -> Result<Vec<S3Bucket>> {
        self.get_json(S3_BUCKETS_PATH).await
    }
}

/// Auth failures pass through untouched; everything else becomes `SourceUnavailable`
fn source_error(source_name: &str, err: RmonError) -> RmonError {
    match err {
        RmonError::Auth(_) | RmonError::SourceUnavailable { .. } => err,
        other => RmonError::unavailable(source_name, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_keeps_auth() {
        assert!(matches!(
            source_error("x", RmonError::Auth("nope".to_string())),
            RmonError::Auth(_)
        ));
        assert!(matches!(
            source_error("x", RmonError::Network("reset".to_string())),
            RmonError::SourceUnavailable { .. }
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..ApiConfig::default()
        };
        let client = ApiClient::new(&config, SessionStore::new(dir.path().join("s.json"))).unwrap();
        assert_eq!(client.url(ALL_RESOURCES_PATH), "http://localhost:8000/api/rmon/all-resources/");
    }
}
