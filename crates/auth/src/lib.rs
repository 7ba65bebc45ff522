//! `remitguard-auth`: pure permission evaluation and guard policies.
//!
//! This crate is intentionally decoupled from HTTP, timers and storage.

pub mod actor;
pub mod evaluate;
pub mod guard;
pub mod menu;
pub mod navigation;
pub mod permissions;
pub mod roles;

pub use actor::Actor;
pub use evaluate::{AccessExplanation, DecisionKind};
pub use guard::{AccessContext, Capability, Guard, GuardDecision, ProtectedRoute, RoutePhase};
pub use menu::{MenuAuthorizationMap, MenuMapError};
pub use navigation::NavigationTargets;
pub use permissions::Permission;
pub use roles::Role;
