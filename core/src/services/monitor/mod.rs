//! Security monitor module correlating violations into composite alerts.

mod security_monitor;

pub use security_monitor::{SecurityMonitor, REPEATED_LOCKOUT_REASON};

#[cfg(test)]
mod tests;
