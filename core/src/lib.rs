//! # ReleaseWatch Core
//!
//! Authentication-defense and audit-telemetry domain for the ReleaseWatch
//! backend. This crate contains the audit event entities, the audit store
//! interface with its in-memory implementation, the login attempt tracker,
//! the per-key rate limiter, the security monitor and the login guard that
//! ties them together.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

mod sync;

// Re-export commonly used types for convenience
pub use clock::{Clock, MockClock, SharedClock, SystemClock};
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
