//! Value objects representing immutable domain concepts.

pub mod login_outcome;
pub mod request_context;

// Re-export commonly used types
pub use login_outcome::LoginFailureOutcome;
pub use request_context::RequestContext;
