pub mod audit;

pub use audit::{AuditStore, InMemoryAuditStore};
