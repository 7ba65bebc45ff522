//! Render-time guard policies.
//!
//! Guards never render anything themselves. They return a [`GuardDecision`]
//! and the presentation layer decides what `Deny` looks like (a fallback or
//! nothing). A denial is an ordinary outcome, not an error.

use serde::{Deserialize, Serialize};

use crate::{Actor, MenuAuthorizationMap, NavigationTargets, Permission, Role, evaluate};

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Deny,
    Redirect(String),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

/// Derived role-class capabilities a guard can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Admin,
    RoleManagement,
    UserManagement,
}

impl Capability {
    pub fn held_by(self, actor: &Actor) -> bool {
        match self {
            Capability::Admin => actor.is_admin(),
            Capability::RoleManagement => actor.can_manage_roles(),
            Capability::UserManagement => actor.can_manage_users(),
        }
    }
}

/// Read-only view of the session that guards evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct AccessContext<'a> {
    pub actor: Option<&'a Actor>,
    pub is_authenticated: bool,
    /// False until persisted session state has been restored.
    pub hydrated: bool,
    pub menus: &'a MenuAuthorizationMap,
}

/// Requirements for a piece of protected content.
///
/// Every requirement that is set must pass. An empty guard allows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard {
    /// Any one of these suffices.
    pub permissions: Vec<Permission>,
    /// Any one of these suffices.
    pub roles: Vec<Role>,
    pub menu: Option<String>,
    pub sub_menu: Option<String>,
    pub action: Option<String>,
    pub capability: Option<Capability>,
}

impl Guard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions<P: Into<Permission>>(permissions: impl IntoIterator<Item = P>) -> Self {
        Self::new().with_permissions(permissions)
    }

    pub fn capability(capability: Capability) -> Self {
        Self {
            capability: Some(capability),
            ..Self::default()
        }
    }

    pub fn menu(menu: impl Into<String>) -> Self {
        Self {
            menu: Some(menu.into()),
            ..Self::default()
        }
    }

    pub fn action(
        menu: impl Into<String>,
        sub_menu: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            menu: Some(menu.into()),
            sub_menu: Some(sub_menu.into()),
            action: Some(action.into()),
            ..Self::default()
        }
    }

    pub fn with_permissions<P: Into<Permission>>(
        mut self,
        permissions: impl IntoIterator<Item = P>,
    ) -> Self {
        self.permissions.extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_roles<R: Into<Role>>(mut self, roles: impl IntoIterator<Item = R>) -> Self {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capability = Some(capability);
        self
    }

    /// Whether the context satisfies every configured requirement.
    pub fn permits(&self, ctx: &AccessContext<'_>) -> bool {
        let actor = ctx.actor;

        if !self.permissions.is_empty() && !evaluate::has_any_permission(actor, &self.permissions) {
            return false;
        }

        if !self.roles.is_empty() && !self.roles.iter().any(|r| evaluate::has_role(actor, r.as_str())) {
            return false;
        }

        if let Some(menu) = &self.menu {
            if !evaluate::can_access_menu(actor, ctx.menus, menu) {
                return false;
            }

            // Action checks only apply when the whole triple is given.
            if let (Some(sub_menu), Some(action)) = (&self.sub_menu, &self.action) {
                if !evaluate::can_perform_action(actor, ctx.menus, menu, sub_menu, action) {
                    return false;
                }
            }
        }

        if let Some(capability) = self.capability {
            if !actor.is_some_and(|a| capability.held_by(a)) {
                return false;
            }
        }

        true
    }

    /// Conditional-render decision: `Allow` or `Deny`.
    pub fn evaluate(&self, ctx: &AccessContext<'_>) -> GuardDecision {
        if self.permits(ctx) {
            GuardDecision::Allow
        } else {
            GuardDecision::Deny
        }
    }
}

/// Phase of a protected route.
///
/// Nothing protected may be shown while `Loading`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePhase {
    Loading,
    Ready(GuardDecision),
}

/// Whole-route guard: authentication first, then the route's requirements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedRoute {
    pub requirements: Guard,
    /// Overrides the login target for unauthenticated visitors.
    pub redirect_to: Option<String>,
}

impl ProtectedRoute {
    pub fn new(requirements: Guard) -> Self {
        Self {
            requirements,
            redirect_to: None,
        }
    }

    pub fn with_redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect_to = Some(target.into());
        self
    }

    pub fn evaluate(&self, ctx: &AccessContext<'_>, targets: &NavigationTargets) -> RoutePhase {
        if !ctx.hydrated {
            return RoutePhase::Loading;
        }

        if !ctx.is_authenticated {
            let target = self.redirect_to.clone().unwrap_or_else(|| targets.login.clone());
            return RoutePhase::Ready(GuardDecision::Redirect(target));
        }

        if !self.requirements.permits(ctx) {
            tracing::debug!("route requirements not met; redirecting to unauthorized surface");
            return RoutePhase::Ready(GuardDecision::Redirect(targets.unauthorized.clone()));
        }

        RoutePhase::Ready(GuardDecision::Allow)
    }
}
