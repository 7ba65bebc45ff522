//! Token lifecycle state machine.
//!
//! ```text
//! Unchecked ──► Valid ──► Expiring ──► Refreshing ──► Valid
//!     │                      │              │
//!     └──────────────────────┴──────────────┴──────► Invalid
//! ```
//!
//! The controller's state doubles as the refresh guard: while `Refreshing`,
//! any further check is a no-op, so at most one refresh is ever in flight.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use serde::Serialize;
use tokio::sync::broadcast;

use remitguard_auth::{Actor, NavigationTargets};

use crate::refresh::{RefreshService, TokenGrant};
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Unchecked,
    Valid,
    Expiring,
    Refreshing,
    Invalid,
}

/// What caused a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckTrigger {
    /// Eager check when the owning UI context starts.
    Mount,
    /// Periodic timer tick.
    Interval,
}

/// Result of a check, as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The credential is still good.
    Valid,
    /// The credential was exchanged for a new one.
    Refreshed,
    /// A refresh is already in flight; nothing was done.
    Skipped,
    /// The session is gone; navigate to `redirect_to`.
    LoginRequired { redirect_to: String },
}

/// A state transition, broadcast to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateChange {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// Owns the lifecycle of the session held in a [`SessionStore`].
pub struct LifecycleController<R> {
    store: SessionStore,
    refresher: R,
    targets: NavigationTargets,
    state: Mutex<LifecycleState>,
    changes: broadcast::Sender<StateChange>,
}

impl<R: RefreshService> LifecycleController<R> {
    pub fn new(store: SessionStore, refresher: R, targets: NavigationTargets) -> Self {
        let (changes, _) = broadcast::channel(32);
        Self {
            store,
            refresher,
            targets,
            state: Mutex::new(LifecycleState::Unchecked),
            changes,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn targets(&self) -> &NavigationTargets {
        &self.targets
    }

    pub fn state(&self) -> LifecycleState {
        *self.lock_state()
    }

    /// Receive every transition from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, state: &mut LifecycleState, to: LifecycleState) {
        let from = *state;
        if from == to {
            return;
        }
        *state = to;
        tracing::debug!(?from, ?to, "session lifecycle transition");
        // No subscribers is fine.
        let _ = self.changes.send(StateChange { from, to });
    }

    fn login_required(&self) -> CheckOutcome {
        CheckOutcome::LoginRequired {
            redirect_to: self.targets.login.clone(),
        }
    }

    fn invalidate(&self, state: &mut LifecycleState) -> CheckOutcome {
        self.store.clear_session();
        self.transition(state, LifecycleState::Invalid);
        self.login_required()
    }

    /// Accept a fresh login and restart the machine at `Valid`.
    pub fn login(
        &self,
        actor: Actor,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Duration,
    ) {
        let actor_id = actor.id;
        self.store
            .set_session(actor, access_token, refresh_token, expires_in);

        let mut state = self.lock_state();
        self.transition(&mut state, LifecycleState::Valid);
        tracing::info!(%actor_id, "session established");
    }

    /// Explicit logout. Returns where to navigate.
    pub fn logout(&self) -> String {
        let mut state = self.lock_state();
        self.invalidate(&mut state);
        tracing::info!("session cleared by logout");
        self.targets.login.clone()
    }

    /// Evaluate the session, refreshing the credential when it has expired.
    ///
    /// Safe to call from both the on-mount path and the periodic timer.
    pub async fn check(&self, trigger: CheckTrigger) -> CheckOutcome {
        let refresh_token = {
            let mut state = self.lock_state();

            if *state == LifecycleState::Unchecked && !self.store.is_hydrated() {
                tracing::debug!(?trigger, "store not hydrated yet; restoring before check");
                self.store.hydrate();
            }

            match *state {
                LifecycleState::Refreshing => {
                    tracing::debug!(?trigger, "refresh already in flight; skipping check");
                    return CheckOutcome::Skipped;
                }
                LifecycleState::Invalid => return self.login_required(),
                LifecycleState::Unchecked if !self.store.has_stored_credential() => {
                    tracing::debug!(?trigger, "no stored session");
                    return self.invalidate(&mut state);
                }
                _ => {}
            }

            if !self.store.is_token_expired() {
                self.transition(&mut state, LifecycleState::Valid);
                return CheckOutcome::Valid;
            }

            self.transition(&mut state, LifecycleState::Expiring);
            match self.store.refresh_token() {
                Some(token) => {
                    self.transition(&mut state, LifecycleState::Refreshing);
                    token
                }
                None => {
                    tracing::info!(?trigger, "access token expired and no refresh token; logging out");
                    return self.invalidate(&mut state);
                }
            }
        };

        tracing::debug!(?trigger, "refreshing access token");
        let result = self
            .refresher
            .refresh(&refresh_token)
            .await
            .and_then(TokenGrant::validate);

        let mut state = self.lock_state();
        if *state != LifecycleState::Refreshing {
            // A login or logout landed while the refresh was in flight.
            tracing::debug!(state = ?*state, "discarding stale refresh result");
            return match *state {
                LifecycleState::Valid => CheckOutcome::Valid,
                _ => self.login_required(),
            };
        }

        match result {
            Ok(grant) => {
                if !self.store.update_token(grant.access_token.clone(), grant.lifetime()) {
                    tracing::info!("session cleared while refreshing; discarding new token");
                    return self.invalidate(&mut state);
                }
                self.transition(&mut state, LifecycleState::Valid);
                tracing::info!(expires_in = grant.expires_in, "access token refreshed");
                CheckOutcome::Refreshed
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; clearing session");
                self.invalidate(&mut state)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use remitguard_auth::{Permission, Role};
    use remitguard_core::{ActorId, ManualClock};

    use crate::persistence::MemoryPersistence;
    use crate::refresh::RefreshError;

    struct StubRefresher {
        calls: AtomicUsize,
        succeed: bool,
    }

    impl StubRefresher {
        fn new(succeed: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                succeed,
            })
        }
    }

    impl RefreshService for StubRefresher {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                Ok(TokenGrant::new("fresh", 3600))
            } else {
                Err(RefreshError::Rejected {
                    status: 401,
                    detail: "refresh token revoked".into(),
                })
            }
        }
    }

    fn actor() -> Actor {
        Actor::new(
            ActorId::new(),
            "Teller",
            Role::new("teller"),
            [Permission::new("view_account")],
        )
    }

    fn controller(
        succeed: bool,
    ) -> (LifecycleController<Arc<StubRefresher>>, Arc<StubRefresher>, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let store = SessionStore::open(Arc::new(MemoryPersistence::new()), Arc::new(clock.clone()));
        let refresher = StubRefresher::new(succeed);
        let controller =
            LifecycleController::new(store, refresher.clone(), NavigationTargets::default());
        (controller, refresher, clock)
    }

    #[tokio::test]
    async fn unchecked_without_session_is_invalid() {
        let (controller, refresher, _) = controller(true);

        let outcome = controller.check(CheckTrigger::Mount).await;

        assert_eq!(outcome, CheckOutcome::LoginRequired { redirect_to: "/login".into() });
        assert_eq!(controller.state(), LifecycleState::Invalid);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unexpired_session_is_valid_without_refresh() {
        let (controller, refresher, _) = controller(true);
        controller
            .store()
            .set_session(actor(), "access", Some("refresh".into()), Duration::minutes(10));

        assert_eq!(controller.check(CheckTrigger::Mount).await, CheckOutcome::Valid);
        assert_eq!(controller.state(), LifecycleState::Valid);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_without_refresh_token_goes_invalid() {
        let (controller, refresher, clock) = controller(true);
        controller.login(actor(), "access", None, Duration::minutes(1));
        clock.advance(Duration::minutes(2));

        let outcome = controller.check(CheckTrigger::Interval).await;

        assert!(matches!(outcome, CheckOutcome::LoginRequired { .. }));
        assert!(controller.store().snapshot().is_empty());
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_is_terminal_until_login() {
        let (controller, _, _) = controller(true);
        controller.check(CheckTrigger::Mount).await;
        assert_eq!(controller.state(), LifecycleState::Invalid);

        // A session appearing behind the controller's back does not revive it.
        controller
            .store()
            .set_session(actor(), "access", None, Duration::minutes(10));
        assert!(matches!(
            controller.check(CheckTrigger::Interval).await,
            CheckOutcome::LoginRequired { .. }
        ));

        controller.login(actor(), "access", None, Duration::minutes(10));
        assert_eq!(controller.check(CheckTrigger::Interval).await, CheckOutcome::Valid);
    }

    #[tokio::test]
    async fn logout_clears_and_reports_login_target() {
        let (controller, _, _) = controller(true);
        controller.login(actor(), "access", Some("refresh".into()), Duration::minutes(10));

        assert_eq!(controller.logout(), "/login");
        assert_eq!(controller.state(), LifecycleState::Invalid);
        assert!(!controller.store().is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_see_transitions_in_order() {
        let (controller, _, clock) = controller(true);
        controller.login(actor(), "access", Some("refresh".into()), Duration::seconds(30));
        let mut changes = controller.subscribe();
        clock.advance(Duration::seconds(31));

        controller.check(CheckTrigger::Interval).await;

        let mut seen = Vec::new();
        while let Ok(change) = changes.try_recv() {
            seen.push(change.to);
        }
        assert_eq!(
            seen,
            vec![LifecycleState::Expiring, LifecycleState::Refreshing, LifecycleState::Valid]
        );
    }
}
