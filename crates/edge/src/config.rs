use thiserror::Error;

use remitguard_auth::NavigationTargets;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Route classification for the edge filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Cookie carrying the access credential.
    pub cookie_name: String,
    /// Always reachable, with or without a credential.
    pub public_prefixes: Vec<String>,
    /// Require a credential.
    pub protected_prefixes: Vec<String>,
    pub targets: NavigationTargets,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            cookie_name: "auth-token".into(),
            public_prefixes: to_strings(&[
                "/login",
                "/register",
                "/forgot-password",
                "/reset-password",
                "/api/auth",
                "/_next",
                "/static",
                "/favicon.ico",
            ]),
            protected_prefixes: to_strings(&[
                "/dashboard",
                "/transfers",
                "/beneficiaries",
                "/settings",
                "/admin",
            ]),
            targets: NavigationTargets::default(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RouteConfig {
    /// Read configuration from the environment.
    ///
    /// # Optional env vars
    /// - `AUTH_COOKIE_NAME`: credential cookie name
    /// - `PUBLIC_PATHS`: comma-separated public prefixes (replaces defaults)
    /// - `PROTECTED_PATHS`: comma-separated protected prefixes (replaces defaults)
    /// - `LOGIN_PATH`, `POST_LOGIN_PATH`: navigation targets
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(name) = lookup("AUTH_COOKIE_NAME") {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "AUTH_COOKIE_NAME",
                    reason: "must not be empty".into(),
                });
            }
            config.cookie_name = name.to_string();
        }
        if let Some(list) = lookup("PUBLIC_PATHS") {
            config.public_prefixes = parse_prefixes("PUBLIC_PATHS", &list)?;
        }
        if let Some(list) = lookup("PROTECTED_PATHS") {
            config.protected_prefixes = parse_prefixes("PROTECTED_PATHS", &list)?;
        }
        if let Some(path) = lookup("LOGIN_PATH") {
            config.targets.login = parse_path("LOGIN_PATH", &path)?;
        }
        if let Some(path) = lookup("POST_LOGIN_PATH") {
            config.targets.post_login = parse_path("POST_LOGIN_PATH", &path)?;
        }

        Ok(config)
    }
}

fn parse_path(name: &'static str, raw: &str) -> Result<String, ConfigError> {
    let path = raw.trim();
    if !path.starts_with('/') {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("'{path}' must start with '/'"),
        });
    }
    Ok(path.to_string())
}

fn parse_prefixes(name: &'static str, raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_path(name, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_lists_replace_defaults() {
        let config = RouteConfig::from_lookup(|name: &str| match name {
            "PROTECTED_PATHS" => Some("/app, /reports ,".into()),
            "AUTH_COOKIE_NAME" => Some("session".into()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.protected_prefixes, vec!["/app", "/reports"]);
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.public_prefixes, RouteConfig::default().public_prefixes);
    }

    #[test]
    fn rejects_relative_prefixes() {
        let err = RouteConfig::from_lookup(|name: &str| {
            (name == "PUBLIC_PATHS").then(|| "/login,docs".to_string())
        })
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "PUBLIC_PATHS", .. }));
    }
}
