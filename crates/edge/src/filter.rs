//! Pure route classification.

use url::form_urlencoded;

use crate::config::RouteConfig;

/// Where the filter sends a request it will not let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub path: String,
    /// Original path, handed to the login page so it can send the user back.
    pub return_to: Option<String>,
}

impl RedirectTarget {
    /// `Location` header value.
    pub fn location(&self) -> String {
        match &self.return_to {
            Some(back) => {
                let encoded: String = form_urlencoded::byte_serialize(back.as_bytes()).collect();
                format!("{}?redirect={encoded}", self.path)
            }
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Redirect(RedirectTarget),
}

#[derive(Debug, Clone)]
pub struct RouteFilter {
    config: RouteConfig,
}

impl RouteFilter {
    pub fn new(config: RouteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Classify a request path given whether a credential accompanies it.
    ///
    /// Rules, first match wins:
    /// - the login page with a credential goes to the post-login landing
    /// - public paths pass
    /// - protected paths without a credential go to the login page
    /// - everything else passes
    pub fn decide(&self, path: &str, has_credential: bool) -> FilterDecision {
        let targets = &self.config.targets;

        if has_credential && path == targets.login {
            return FilterDecision::Redirect(RedirectTarget {
                path: targets.post_login.clone(),
                return_to: None,
            });
        }

        if self.is_public(path) {
            return FilterDecision::Allow;
        }

        if !has_credential && self.is_protected(path) {
            return FilterDecision::Redirect(RedirectTarget {
                path: targets.login.clone(),
                return_to: Some(path.to_string()),
            });
        }

        FilterDecision::Allow
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.config
            .public_prefixes
            .iter()
            .any(|p| matches_prefix(path, p))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.config
            .protected_prefixes
            .iter()
            .any(|p| matches_prefix(path, p))
    }
}

/// Segment-aware prefix match: `/dashboard` covers `/dashboard/payments`
/// but not `/dashboards`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let Some(rest) = path.strip_prefix(prefix) else {
        return false;
    };
    rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> RouteFilter {
        RouteFilter::new(RouteConfig::default())
    }

    fn login_redirect(from: &str) -> FilterDecision {
        FilterDecision::Redirect(RedirectTarget {
            path: "/login".into(),
            return_to: Some(from.into()),
        })
    }

    #[test]
    fn protected_path_without_credential_redirects_to_login() {
        let f = filter();
        assert_eq!(
            f.decide("/dashboard/payments", false),
            login_redirect("/dashboard/payments")
        );
        assert_eq!(f.decide("/dashboard/payments", true), FilterDecision::Allow);
    }

    #[test]
    fn public_paths_always_pass() {
        let f = filter();
        for path in ["/register", "/forgot-password", "/_next/static/app.js", "/favicon.ico"] {
            assert_eq!(f.decide(path, false), FilterDecision::Allow, "{path}");
            assert_eq!(f.decide(path, true), FilterDecision::Allow, "{path}");
        }
    }

    #[test]
    fn login_page_with_credential_goes_to_landing() {
        let f = filter();
        assert_eq!(
            f.decide("/login", true),
            FilterDecision::Redirect(RedirectTarget {
                path: "/dashboard".into(),
                return_to: None,
            })
        );
        assert_eq!(f.decide("/login", false), FilterDecision::Allow);
    }

    #[test]
    fn only_the_exact_login_page_bounces_signed_in_users() {
        let f = filter();
        assert_eq!(f.decide("/login/help", true), FilterDecision::Allow);
        assert_eq!(f.decide("/login/verify", false), FilterDecision::Allow);
    }

    #[test]
    fn unclassified_paths_pass() {
        let f = filter();
        assert_eq!(f.decide("/", false), FilterDecision::Allow);
        assert_eq!(f.decide("/about", false), FilterDecision::Allow);
    }

    #[test]
    fn prefix_match_respects_segments() {
        let f = filter();
        assert!(f.is_protected("/dashboard"));
        assert!(f.is_protected("/dashboard/"));
        assert!(f.is_protected("/admin/users/42"));
        assert!(!f.is_protected("/dashboards"));
        assert!(!f.is_protected("/administrator"));
    }

    #[test]
    fn location_encodes_return_path() {
        let target = RedirectTarget {
            path: "/login".into(),
            return_to: Some("/transfers/new".into()),
        };
        assert_eq!(target.location(), "/login?redirect=%2Ftransfers%2Fnew");

        let plain = RedirectTarget {
            path: "/dashboard".into(),
            return_to: None,
        };
        assert_eq!(plain.location(), "/dashboard");
    }

    #[test]
    fn custom_targets_are_honoured() {
        let mut config = RouteConfig::default();
        config.targets = config.targets.with_login("/signin").with_post_login("/home");
        config.public_prefixes.push("/signin".into());
        let f = RouteFilter::new(config);

        assert_eq!(
            f.decide("/settings", false),
            FilterDecision::Redirect(RedirectTarget {
                path: "/signin".into(),
                return_to: Some("/settings".into()),
            })
        );
        assert_eq!(
            f.decide("/signin", true),
            FilterDecision::Redirect(RedirectTarget {
                path: "/home".into(),
                return_to: None,
            })
        );
    }
}
