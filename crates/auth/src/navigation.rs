use serde::{Deserialize, Serialize};

/// Where the presentation layer should send the user after a decision.
///
/// These are client-side surfaces, not contracts with the issuing backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationTargets {
    pub login: String,
    pub unauthorized: String,
    pub post_login: String,
}

impl Default for NavigationTargets {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            unauthorized: "/unauthorized".into(),
            post_login: "/dashboard".into(),
        }
    }
}

impl NavigationTargets {
    pub fn with_login(mut self, path: impl Into<String>) -> Self {
        self.login = path.into();
        self
    }

    pub fn with_unauthorized(mut self, path: impl Into<String>) -> Self {
        self.unauthorized = path.into();
        self
    }

    pub fn with_post_login(mut self, path: impl Into<String>) -> Self {
        self.post_login = path.into();
        self
    }
}
