//! `remitguard-core`: shared building blocks for the authorization core.
//!
//! Pure types only: identifiers, the error model and the clock seam.

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use id::ActorId;
