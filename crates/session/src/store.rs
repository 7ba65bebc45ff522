//! The session store: single source of truth for the client session.
//!
//! # Invariants
//! - An access token is never stored without an expiry.
//! - A token without an actor never authenticates.
//! - Every mutation is persisted; a persistence failure is logged and the
//!   in-memory state stays authoritative.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use remitguard_auth::{AccessContext, Actor, MenuAuthorizationMap, evaluate};
use remitguard_core::{Clock, SharedClock, SystemClock};

use crate::persistence::{MemoryPersistence, SessionPersistence};

/// Key the session record is persisted under.
pub const SESSION_KEY: &str = "remitguard.session";

/// The session record. This is also the persisted layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub actor: Option<Actor>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Absent expiry counts as expired.
    pub fn is_token_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    pub fn is_authenticated(&self, now: DateTime<Utc>) -> bool {
        self.has_stored_credential() && !self.is_token_expired(now)
    }

    /// An actor and an access token are present, expired or not.
    pub fn has_stored_credential(&self) -> bool {
        self.actor.is_some() && self.access_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Session::default()
    }

    pub fn access_context<'a>(
        &'a self,
        now: DateTime<Utc>,
        hydrated: bool,
        menus: &'a MenuAuthorizationMap,
    ) -> AccessContext<'a> {
        AccessContext {
            actor: self.actor.as_ref(),
            is_authenticated: self.is_authenticated(now),
            hydrated,
            menus,
        }
    }

    /// Drop fields that break the record's invariants.
    fn sanitized(mut self) -> Self {
        if self.access_token.is_some() && self.expires_at.is_none() {
            tracing::warn!("persisted access token has no expiry; discarding it");
            self.access_token = None;
        }
        self
    }
}

#[derive(Debug, Default)]
struct StoreState {
    session: Session,
    hydrated: bool,
}

/// Cloneable handle to the one session of this runtime.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<RwLock<StoreState>>,
    persistence: Arc<dyn SessionPersistence>,
    clock: SharedClock,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("SessionStore")
            .field("hydrated", &state.hydrated)
            .field("has_actor", &state.session.actor.is_some())
            .field("expires_at", &state.session.expires_at)
            .finish()
    }
}

impl SessionStore {
    /// An empty, not yet hydrated store.
    pub fn new(persistence: Arc<dyn SessionPersistence>, clock: SharedClock) -> Self {
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            persistence,
            clock,
        }
    }

    /// Create a store and immediately restore the persisted session.
    pub fn open(persistence: Arc<dyn SessionPersistence>, clock: SharedClock) -> Self {
        let store = Self::new(persistence, clock);
        store.hydrate();
        store
    }

    /// Memory-backed store on the system clock, already hydrated.
    pub fn in_memory() -> Self {
        Self::open(Arc::new(MemoryPersistence::new()), Arc::new(SystemClock))
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Restore the persisted session.
    ///
    /// Absent or unreadable state yields an empty session; either way the
    /// store is marked hydrated so guards can stop waiting.
    pub fn hydrate(&self) {
        let session = match self.persistence.load(SESSION_KEY) {
            Ok(None) => Session::default(),
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => session.sanitized(),
                Err(e) => {
                    tracing::warn!(error = %e, "persisted session is malformed; starting empty");
                    if let Err(e) = self.persistence.remove(SESSION_KEY) {
                        tracing::warn!(error = %e, "failed to remove malformed session record");
                    }
                    Session::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted session; starting empty");
                Session::default()
            }
        };

        let mut state = self.write();
        state.session = session;
        state.hydrated = true;
        tracing::debug!(
            has_actor = state.session.actor.is_some(),
            "session store hydrated"
        );
    }

    pub fn is_hydrated(&self) -> bool {
        self.read().hydrated
    }

    fn persist(&self, session: &Session) {
        let result = if session.is_empty() {
            self.persistence.remove(SESSION_KEY)
        } else {
            match serde_json::to_string(session) {
                Ok(raw) => self.persistence.save(SESSION_KEY, &raw),
                Err(e) => {
                    tracing::error!(error = %e, "failed to serialize session");
                    return;
                }
            }
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session; continuing in memory");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the whole session. `expires_at = now + expires_in`.
    pub fn set_session(
        &self,
        actor: Actor,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Duration,
    ) {
        let session = Session {
            actor: Some(actor),
            access_token: Some(access_token.into()),
            refresh_token,
            expires_at: Some(self.expiry_after(expires_in)),
        };

        let mut state = self.write();
        state.session = session;
        state.hydrated = true;
        self.persist(&state.session);
    }

    /// Replace only the access token and its expiry.
    ///
    /// No-op when there is no session; this never establishes one. Returns
    /// whether the token was applied.
    pub fn update_token(&self, access_token: impl Into<String>, expires_in: Duration) -> bool {
        let expires_at = self.expiry_after(expires_in);

        let mut state = self.write();
        if state.session.actor.is_none() {
            tracing::debug!("update_token called without a session; ignoring");
            return false;
        }
        state.session.access_token = Some(access_token.into());
        state.session.expires_at = Some(expires_at);
        self.persist(&state.session);
        true
    }

    /// `now + expires_in`; an unrepresentable expiry counts as already expired.
    fn expiry_after(&self, expires_in: Duration) -> DateTime<Utc> {
        let now = self.now();
        now.checked_add_signed(expires_in).unwrap_or_else(|| {
            tracing::warn!(?expires_in, "credential lifetime overflows; treating as expired");
            now
        })
    }

    /// Idempotent.
    pub fn clear_session(&self) {
        let mut state = self.write();
        state.session = Session::default();
        self.persist(&state.session);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Session {
        self.read().session.clone()
    }

    pub fn actor(&self) -> Option<Actor> {
        self.read().session.actor.clone()
    }

    pub fn access_token(&self) -> Option<String> {
        let state = self.read();
        // A token without an actor is not a session.
        state.session.actor.as_ref()?;
        state.session.access_token.clone()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().session.refresh_token.clone()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.read().session.expires_at
    }

    pub fn is_token_expired(&self) -> bool {
        let now = self.now();
        self.read().session.is_token_expired(now)
    }

    pub fn is_authenticated(&self) -> bool {
        let now = self.now();
        self.read().session.is_authenticated(now)
    }

    pub fn has_stored_credential(&self) -> bool {
        self.read().session.has_stored_credential()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        evaluate::has_permission(self.read().session.actor.as_ref(), permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        evaluate::has_role(self.read().session.actor.as_ref(), role)
    }

    /// True if **any** of `permissions` is held.
    pub fn can_access<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        evaluate::can_access(self.read().session.actor.as_ref(), permissions)
    }

    pub fn has_any_permission<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        evaluate::has_any_permission(self.read().session.actor.as_ref(), permissions)
    }

    pub fn has_all_permissions<S: AsRef<str>>(&self, permissions: &[S]) -> bool {
        evaluate::has_all_permissions(self.read().session.actor.as_ref(), permissions)
    }

    pub fn can_access_menu(&self, menus: &MenuAuthorizationMap, menu: &str) -> bool {
        evaluate::can_access_menu(self.read().session.actor.as_ref(), menus, menu)
    }

    pub fn can_perform_action(
        &self,
        menus: &MenuAuthorizationMap,
        menu: &str,
        sub_menu: &str,
        action: &str,
    ) -> bool {
        evaluate::can_perform_action(self.read().session.actor.as_ref(), menus, menu, sub_menu, action)
    }

    /// Run a guard evaluation against the current session without cloning it.
    pub fn with_access<T>(
        &self,
        menus: &MenuAuthorizationMap,
        f: impl FnOnce(&AccessContext<'_>) -> T,
    ) -> T {
        let now = self.now();
        let state = self.read();
        let ctx = state.session.access_context(now, state.hydrated, menus);
        f(&ctx)
    }
}
