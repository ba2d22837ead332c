//! Audit store module.

mod r#trait;
pub use r#trait::AuditStore;

mod memory;
pub use memory::InMemoryAuditStore;

#[cfg(test)]
mod tests;
