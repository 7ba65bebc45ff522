use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Roles whose holders bypass every menu and action check.
pub const ADMIN_ROLES: &[&str] = &["admin", "super_admin"];

/// Role identifier used for RBAC.
///
/// Roles are intentionally opaque strings at this layer; the only roles the
/// core interprets are the [`ADMIN_ROLES`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        ADMIN_ROLES.contains(&self.as_str())
    }
}

impl From<&'static str> for Role {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
