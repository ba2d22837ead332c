//! Tests for the security monitor

mod security_monitor_tests;
