//! Request metadata carried into audit events

use serde::{Deserialize, Serialize};

use crate::domain::entities::audit::UNKNOWN;

/// Client address and user agent of the request being audited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    ip_address: String,
    user_agent: String,
}

impl RequestContext {
    /// Blank or missing values are recorded as "unknown"
    pub fn new(ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            ip_address: normalize(ip_address),
            user_agent: normalize(user_agent),
        }
    }

    pub fn unknown() -> Self {
        Self::new(None, None)
    }

    pub fn ip_address(&self) -> &str {
        &self.ip_address
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::unknown()
    }
}

fn normalize(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => UNKNOWN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_become_unknown() {
        let ctx = RequestContext::new(Some("  "), None);
        assert_eq!(ctx.ip_address(), "unknown");
        assert_eq!(ctx.user_agent(), "unknown");
    }

    #[test]
    fn test_values_are_trimmed() {
        let ctx = RequestContext::new(Some(" 10.0.0.1 "), Some("curl/8.0"));
        assert_eq!(ctx.ip_address(), "10.0.0.1");
        assert_eq!(ctx.user_agent(), "curl/8.0");
    }
}
