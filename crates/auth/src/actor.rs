use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use remitguard_core::ActorId;

use crate::permissions::{ROLE_MANAGEMENT, USER_MANAGEMENT};
use crate::{Permission, Role};

/// The authenticated identity carried by a session.
///
/// Only the permission set and role are stored. The admin flag and the
/// management capabilities are derived on every read so they cannot drift
/// from the grant they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
    pub permissions: BTreeSet<Permission>,
    pub role: Role,
}

impl Actor {
    pub fn new(
        id: ActorId,
        display_name: impl Into<String>,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            permissions: permissions.into_iter().collect(),
            role,
        }
    }

    fn holds_wildcard(&self) -> bool {
        self.permissions.iter().any(Permission::is_wildcard)
    }

    /// Whether the permission set grants `permission` (directly or by wildcard).
    pub fn has_permission(&self, permission: &str) -> bool {
        self.holds_wildcard() || self.permissions.iter().any(|p| p.as_str() == permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_str() == role
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().any(|p| self.has_permission(p.as_ref()))
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        permissions.iter().all(|p| self.has_permission(p.as_ref()))
    }

    /// Admins bypass every menu and action check.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin() || self.holds_wildcard()
    }

    pub fn can_manage_roles(&self) -> bool {
        self.is_admin() || self.has_permission(ROLE_MANAGEMENT)
    }

    pub fn can_manage_users(&self) -> bool {
        self.is_admin() || self.has_permission(USER_MANAGEMENT)
    }
}
