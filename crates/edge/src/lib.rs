//! `remitguard-edge`: request filter that runs before any page is rendered.
//!
//! The filter only proves that *a* credential accompanies the request. It
//! does not decode it and has no view of the client session, so it cannot
//! check permissions; the guard layer in `remitguard-auth` re-checks every
//! protected surface once the session is loaded.

pub mod config;
pub mod credential;
pub mod filter;
pub mod middleware;

pub use config::{ConfigError, RouteConfig};
pub use credential::{CredentialSource, extract_credential};
pub use filter::{FilterDecision, RedirectTarget, RouteFilter};
pub use middleware::{protect, route_filter};
