//! Credential exchange with the issuing backend.
//!
//! A refresh is a single attempt. Retry and backoff, if wanted, belong to the
//! caller; the lifecycle controller deliberately does neither.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest credential lifetime accepted from the issuing backend (one year).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 366 * 24 * 60 * 60;

/// A freshly issued access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl TokenGrant {
    pub fn new(access_token: impl Into<String>, expires_in: i64) -> Self {
        Self {
            access_token: access_token.into(),
            expires_in,
        }
    }

    /// Zero when `expires_in` is out of range; call [`validate`](Self::validate) first.
    pub fn lifetime(&self) -> Duration {
        Duration::try_seconds(self.expires_in).unwrap_or_else(Duration::zero)
    }

    /// Reject grants that cannot describe a usable credential.
    pub fn validate(self) -> Result<Self, RefreshError> {
        if self.access_token.trim().is_empty() {
            return Err(RefreshError::Malformed("empty access token".into()));
        }
        if self.expires_in <= 0 {
            return Err(RefreshError::Malformed(format!(
                "non-positive expiresIn: {}",
                self.expires_in
            )));
        }
        if self.expires_in > MAX_TOKEN_LIFETIME_SECS {
            return Err(RefreshError::Malformed(format!(
                "expiresIn out of range: {}",
                self.expires_in
            )));
        }
        Ok(self)
    }
}

/// The refresh attempt failed. Every variant means the session cannot continue.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("refresh request failed: {0}")]
    Network(String),

    #[error("refresh rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("malformed refresh response: {0}")]
    Malformed(String),
}

/// Exchanges a refresh credential for a new access credential.
pub trait RefreshService: Send + Sync + 'static {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, RefreshError>> + Send;
}

impl<T: RefreshService> RefreshService for Arc<T> {
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, RefreshError>> + Send {
        (**self).refresh(refresh_token)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Calls `POST {endpoint}` with `{"refreshToken": ...}`.
#[derive(Debug, Clone)]
pub struct HttpRefreshService {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpRefreshService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or timeouts).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RefreshService for HttpRefreshService {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, RefreshError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let grant: TokenGrant = response
            .json()
            .await
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;

        grant.validate()
    }
}
