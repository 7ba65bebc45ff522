//! Permission evaluation over the (optional) current actor.
//!
//! - No IO
//! - No panics
//! - No actor means no access: every query returns `false`
//! - Unknown menu/sub-menu/action means no access (fail closed)

use serde::Serialize;

use crate::{Actor, MenuAuthorizationMap};

pub fn has_permission(actor: Option<&Actor>, permission: &str) -> bool {
    actor.is_some_and(|a| a.has_permission(permission))
}

pub fn has_role(actor: Option<&Actor>, role: &str) -> bool {
    actor.is_some_and(|a| a.has_role(role))
}

/// True if **any** of `permissions` is held.
pub fn can_access<S: AsRef<str>>(actor: Option<&Actor>, permissions: &[S]) -> bool {
    has_any_permission(actor, permissions)
}

pub fn has_any_permission<S: AsRef<str>>(actor: Option<&Actor>, permissions: &[S]) -> bool {
    actor.is_some_and(|a| a.has_any_permission(permissions))
}

pub fn has_all_permissions<S: AsRef<str>>(actor: Option<&Actor>, permissions: &[S]) -> bool {
    actor.is_some_and(|a| a.has_all_permissions(permissions))
}

pub fn is_admin(actor: Option<&Actor>) -> bool {
    actor.is_some_and(Actor::is_admin)
}

/// Admin, or holds at least one permission listed anywhere under `menu`.
pub fn can_access_menu(actor: Option<&Actor>, menus: &MenuAuthorizationMap, menu: &str) -> bool {
    let Some(actor) = actor else {
        return false;
    };
    if actor.is_admin() {
        return true;
    }

    menus
        .menu_permissions(menu)
        .any(|p| actor.has_permission(p.as_str()))
}

/// Admin, or holds a permission listed for exactly `(menu, sub_menu, action)`.
pub fn can_perform_action(
    actor: Option<&Actor>,
    menus: &MenuAuthorizationMap,
    menu: &str,
    sub_menu: &str,
    action: &str,
) -> bool {
    explain_action(actor, menus, menu, sub_menu, action).granted
}

/// Menus the actor may open, in map order.
pub fn accessible_menus<'a>(actor: Option<&Actor>, menus: &'a MenuAuthorizationMap) -> Vec<&'a str> {
    menus
        .menus()
        .filter(|menu| can_access_menu(actor, menus, menu))
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why an action check was granted or denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub menu: String,
    pub sub_menu: String,
    pub action: String,
    pub granted: bool,
    pub kind: DecisionKind,
    /// The first held permission that unlocked the triple, if any.
    pub matched_permission: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    AdminBypass,
    PermissionMatched,
    NoActor,
    UnknownEntry,
    MissingPermission,
}

/// Evaluate an action check and report how the decision was reached.
pub fn explain_action(
    actor: Option<&Actor>,
    menus: &MenuAuthorizationMap,
    menu: &str,
    sub_menu: &str,
    action: &str,
) -> AccessExplanation {
    let decide = |granted: bool, kind: DecisionKind, matched: Option<String>| AccessExplanation {
        menu: menu.to_string(),
        sub_menu: sub_menu.to_string(),
        action: action.to_string(),
        granted,
        kind,
        matched_permission: matched,
    };

    let Some(actor) = actor else {
        return decide(false, DecisionKind::NoActor, None);
    };
    if actor.is_admin() {
        return decide(true, DecisionKind::AdminBypass, None);
    }

    let Some(required) = menus.permissions_for(menu, sub_menu, action) else {
        tracing::debug!(menu, sub_menu, action, "action not present in menu map; denying");
        return decide(false, DecisionKind::UnknownEntry, None);
    };

    match required.iter().find(|p| actor.has_permission(p.as_str())) {
        Some(p) => decide(true, DecisionKind::PermissionMatched, Some(p.to_string())),
        None => decide(false, DecisionKind::MissingPermission, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Permission, Role};
    use remitguard_core::ActorId;

    fn actor(role: &'static str, perms: &[&'static str]) -> Actor {
        Actor::new(
            ActorId::new(),
            "Test",
            Role::new(role),
            perms.iter().map(|p| Permission::new(*p)),
        )
    }

    fn menu_map() -> MenuAuthorizationMap {
        MenuAuthorizationMap::new()
            .with_action("dashboard", "account", "view_account", ["view_account"])
            .with_action("dashboard", "account", "delete_account", ["delete_account"])
            .with_action("transfers", "outgoing", "send", ["send_transfer"])
    }

    #[test]
    fn action_requires_exact_triple() {
        let viewer = actor("operator", &["view_account"]);
        let map = menu_map();

        assert!(can_perform_action(Some(&viewer), &map, "dashboard", "account", "view_account"));
        assert!(!can_perform_action(Some(&viewer), &map, "dashboard", "account", "delete_account"));
    }

    #[test]
    fn menu_access_uses_any_listed_permission() {
        let sender = actor("operator", &["send_transfer"]);
        let map = menu_map();

        assert!(can_access_menu(Some(&sender), &map, "transfers"));
        assert!(!can_access_menu(Some(&sender), &map, "dashboard"));
        assert_eq!(accessible_menus(Some(&sender), &map), vec!["transfers"]);
    }

    #[test]
    fn unknown_entries_fail_closed() {
        let viewer = actor("operator", &["view_account"]);
        let map = menu_map();

        let explanation = explain_action(Some(&viewer), &map, "reports", "daily", "export");
        assert!(!explanation.granted);
        assert_eq!(explanation.kind, DecisionKind::UnknownEntry);
        assert!(!can_access_menu(Some(&viewer), &map, "reports"));
    }

    #[test]
    fn no_actor_denies_everything() {
        let map = menu_map();

        assert!(!has_permission(None, "view_account"));
        assert!(!has_role(None, "operator"));
        assert!(!can_access(None, &["view_account"]));
        assert!(!has_all_permissions::<&str>(None, &[]));
        assert!(!can_access_menu(None, &map, "dashboard"));
        assert!(accessible_menus(None, &map).is_empty());
        assert_eq!(
            explain_action(None, &map, "dashboard", "account", "view_account").kind,
            DecisionKind::NoActor
        );
    }

    #[test]
    fn admin_bypasses_map_even_when_empty() {
        let admin = actor("admin", &[]);
        let empty = MenuAuthorizationMap::new();

        assert!(can_access_menu(Some(&admin), &empty, "anything"));
        assert!(can_perform_action(Some(&admin), &empty, "a", "b", "c"));
        assert_eq!(
            explain_action(Some(&admin), &empty, "a", "b", "c").kind,
            DecisionKind::AdminBypass
        );
    }

    #[test]
    fn explanation_reports_matched_permission() {
        let viewer = actor("operator", &["view_account"]);
        let explanation = explain_action(Some(&viewer), &menu_map(), "dashboard", "account", "view_account");

        assert_eq!(explanation.kind, DecisionKind::PermissionMatched);
        assert_eq!(explanation.matched_permission.as_deref(), Some("view_account"));
    }

    mod properties {
        use super::actor;
        use crate::MenuAuthorizationMap;
        use crate::evaluate::{can_access_menu, can_perform_action};
        use proptest::prelude::*;

        fn name() -> impl Strategy<Value = String> {
            "[a-z_]{1,12}"
        }

        fn entries() -> impl Strategy<Value = Vec<(String, String, String, Vec<String>)>> {
            prop::collection::vec(
                (name(), name(), name(), prop::collection::vec(name(), 0..3)),
                0..8,
            )
        }

        fn build(entries: Vec<(String, String, String, Vec<String>)>) -> MenuAuthorizationMap {
            entries
                .into_iter()
                .fold(MenuAuthorizationMap::new(), |map, (menu, sub, action, perms)| {
                    map.with_action(menu, sub, action, perms)
                })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// An admin may perform any action on any map, listed or not.
            #[test]
            fn admin_performs_any_action(
                entries in entries(),
                menu in name(),
                sub in name(),
                action in name(),
                admin_role in prop::sample::select(vec!["admin", "super_admin"]),
            ) {
                let map = build(entries);
                let admin = actor(admin_role, &[]);
                prop_assert!(can_perform_action(Some(&admin), &map, &menu, &sub, &action));
                prop_assert!(can_access_menu(Some(&admin), &map, &menu));
            }

            /// Without an actor nothing is granted.
            #[test]
            fn anonymous_performs_nothing(
                entries in entries(),
                menu in name(),
                sub in name(),
                action in name(),
            ) {
                let map = build(entries);
                prop_assert!(!can_perform_action(None, &map, &menu, &sub, &action));
                prop_assert!(!can_access_menu(None, &map, &menu));
            }
        }
    }
}
