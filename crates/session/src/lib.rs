//! `remitguard-session`
//!
//! **Responsibility:** the client-side session: what is stored, how it is
//! persisted, how credentials are refreshed and when the session is dropped.
//!
//! This crate provides:
//! - [`SessionStore`]: the single source of truth for the session
//! - [`SessionPersistence`]: key-value persistence surface (memory, file)
//! - [`RefreshService`]: credential exchange with the issuing backend
//! - [`LifecycleController`]: the token lifecycle state machine
//! - [`LifecycleWorker`]: on-mount plus periodic expiry checks

pub mod config;
pub mod lifecycle;
pub mod persistence;
pub mod refresh;
pub mod store;
pub mod worker;

pub use config::{ConfigError, SessionConfig};
pub use lifecycle::{CheckOutcome, CheckTrigger, LifecycleController, LifecycleState, StateChange};
pub use persistence::{FilePersistence, MemoryPersistence, PersistenceError, SessionPersistence};
pub use refresh::{HttpRefreshService, RefreshError, RefreshService, TokenGrant};
pub use store::{Session, SessionStore};
pub use worker::{LifecycleWorker, WorkerHandle};
