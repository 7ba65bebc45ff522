//! Client session configuration (environment driven).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use remitguard_auth::NavigationTargets;

use crate::persistence::{FilePersistence, PersistenceError};
use crate::refresh::HttpRefreshService;
use crate::worker::DEFAULT_CHECK_INTERVAL;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Base URL of the issuing backend.
    pub api_url: String,
    pub refresh_path: String,
    pub check_interval: Duration,
    /// Where the session record lives; `None` means the OS data directory.
    pub store_dir: Option<PathBuf>,
    pub targets: NavigationTargets,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".into(),
            refresh_path: "/auth/refresh".into(),
            check_interval: DEFAULT_CHECK_INTERVAL,
            store_dir: None,
            targets: NavigationTargets::default(),
        }
    }
}

impl SessionConfig {
    /// Read configuration from the environment.
    ///
    /// # Optional env vars
    /// - `AUTH_API_URL`: issuing backend base URL
    /// - `AUTH_REFRESH_PATH`: refresh endpoint path
    /// - `SESSION_CHECK_INTERVAL_SECS`: expiry check period (seconds, > 0)
    /// - `SESSION_STORE_DIR`: directory for the persisted session
    /// - `LOGIN_PATH`, `UNAUTHORIZED_PATH`, `POST_LOGIN_PATH`: navigation targets
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("AUTH_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup("AUTH_REFRESH_PATH") {
            config.refresh_path = normalize_path("AUTH_REFRESH_PATH", &path)?;
        }
        if let Some(secs) = lookup("SESSION_CHECK_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::Invalid {
                name: "SESSION_CHECK_INTERVAL_SECS",
                reason: format!("{e}"),
            })?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    name: "SESSION_CHECK_INTERVAL_SECS",
                    reason: "must be greater than zero".into(),
                });
            }
            config.check_interval = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("SESSION_STORE_DIR") {
            config.store_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = lookup("LOGIN_PATH") {
            config.targets.login = normalize_path("LOGIN_PATH", &path)?;
        }
        if let Some(path) = lookup("UNAUTHORIZED_PATH") {
            config.targets.unauthorized = normalize_path("UNAUTHORIZED_PATH", &path)?;
        }
        if let Some(path) = lookup("POST_LOGIN_PATH") {
            config.targets.post_login = normalize_path("POST_LOGIN_PATH", &path)?;
        }

        Ok(config)
    }

    pub fn refresh_endpoint(&self) -> String {
        format!("{}{}", self.api_url, self.refresh_path)
    }

    pub fn refresh_service(&self) -> HttpRefreshService {
        HttpRefreshService::new(self.refresh_endpoint())
    }

    pub fn persistence(&self) -> Result<FilePersistence, PersistenceError> {
        match &self.store_dir {
            Some(dir) => Ok(FilePersistence::new(dir)),
            None => FilePersistence::in_default_dir(),
        }
    }
}

fn normalize_path(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let path = raw.trim();
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("'{path}' must start with '/'"),
        });
    }
    Ok(path.to_string())
}
