//! Audit log entity for recording authentication and security events.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::domain::value_objects::RequestContext;
use crate::errors::DomainError;

/// Placeholder stored when the request carried no IP address or user agent
pub const UNKNOWN: &str = "unknown";

/// Default number of rows returned by an audit query
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Free-form event payload, always a JSON object
pub type AuditDetails = Map<String, JsonValue>;

/// Closed set of audited events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    // Authentication events
    AuthLoginSuccess,
    AuthLoginFailure,
    AuthLogout,
    AuthSessionRefresh,
    AuthPasswordReset,
    AuthPasswordChange,

    // User management events
    UserCreate,
    UserDelete,
    UserUpdate,
    UserPermissionChange,

    // Configuration events
    ConfigUpdate,
    ConfigSourceToggle,
    ConfigFeedToggle,

    // Data events
    DataDelete,
    DataCollection,

    // API events
    ApiCall,
    ApiKeyGenerate,
    ApiKeyRevoke,

    // Security events
    SecurityPermissionDenied,
    SecuritySuspiciousActivity,
    SecurityRateLimitAbuse,
}

/// Grouping of event types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    Authentication,
    UserManagement,
    Configuration,
    Data,
    Api,
    Security,
}

/// How urgently an event deserves attention
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl AuditEventType {
    /// Every event type, in declaration order
    pub const ALL: [AuditEventType; 21] = [
        Self::AuthLoginSuccess,
        Self::AuthLoginFailure,
        Self::AuthLogout,
        Self::AuthSessionRefresh,
        Self::AuthPasswordReset,
        Self::AuthPasswordChange,
        Self::UserCreate,
        Self::UserDelete,
        Self::UserUpdate,
        Self::UserPermissionChange,
        Self::ConfigUpdate,
        Self::ConfigSourceToggle,
        Self::ConfigFeedToggle,
        Self::DataDelete,
        Self::DataCollection,
        Self::ApiCall,
        Self::ApiKeyGenerate,
        Self::ApiKeyRevoke,
        Self::SecurityPermissionDenied,
        Self::SecuritySuspiciousActivity,
        Self::SecurityRateLimitAbuse,
    ];

    /// Convert to string representation for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthLoginSuccess => "AUTH_LOGIN_SUCCESS",
            Self::AuthLoginFailure => "AUTH_LOGIN_FAILURE",
            Self::AuthLogout => "AUTH_LOGOUT",
            Self::AuthSessionRefresh => "AUTH_SESSION_REFRESH",
            Self::AuthPasswordReset => "AUTH_PASSWORD_RESET",
            Self::AuthPasswordChange => "AUTH_PASSWORD_CHANGE",
            Self::UserCreate => "USER_CREATE",
            Self::UserDelete => "USER_DELETE",
            Self::UserUpdate => "USER_UPDATE",
            Self::UserPermissionChange => "USER_PERMISSION_CHANGE",
            Self::ConfigUpdate => "CONFIG_UPDATE",
            Self::ConfigSourceToggle => "CONFIG_SOURCE_TOGGLE",
            Self::ConfigFeedToggle => "CONFIG_FEED_TOGGLE",
            Self::DataDelete => "DATA_DELETE",
            Self::DataCollection => "DATA_COLLECTION",
            Self::ApiCall => "API_CALL",
            Self::ApiKeyGenerate => "API_KEY_GENERATE",
            Self::ApiKeyRevoke => "API_KEY_REVOKE",
            Self::SecurityPermissionDenied => "SECURITY_PERMISSION_DENIED",
            Self::SecuritySuspiciousActivity => "SECURITY_SUSPICIOUS_ACTIVITY",
            Self::SecurityRateLimitAbuse => "SECURITY_RATE_LIMIT_ABUSE",
        }
    }

    pub fn category(&self) -> AuditCategory {
        match self {
            Self::AuthLoginSuccess
            | Self::AuthLoginFailure
            | Self::AuthLogout
            | Self::AuthSessionRefresh
            | Self::AuthPasswordReset
            | Self::AuthPasswordChange => AuditCategory::Authentication,
            Self::UserCreate | Self::UserDelete | Self::UserUpdate | Self::UserPermissionChange => {
                AuditCategory::UserManagement
            }
            Self::ConfigUpdate | Self::ConfigSourceToggle | Self::ConfigFeedToggle => {
                AuditCategory::Configuration
            }
            Self::DataDelete | Self::DataCollection => AuditCategory::Data,
            Self::ApiCall | Self::ApiKeyGenerate | Self::ApiKeyRevoke => AuditCategory::Api,
            Self::SecurityPermissionDenied
            | Self::SecuritySuspiciousActivity
            | Self::SecurityRateLimitAbuse => AuditCategory::Security,
        }
    }

    pub fn severity(&self) -> AuditSeverity {
        match self {
            Self::SecuritySuspiciousActivity | Self::SecurityRateLimitAbuse => {
                AuditSeverity::Critical
            }
            Self::AuthLoginFailure
            | Self::AuthPasswordReset
            | Self::AuthPasswordChange
            | Self::UserDelete
            | Self::UserPermissionChange
            | Self::DataDelete
            | Self::ApiKeyGenerate
            | Self::ApiKeyRevoke
            | Self::SecurityPermissionDenied => AuditSeverity::Warning,
            _ => AuditSeverity::Info,
        }
    }

    /// Outcome recorded when the caller does not set one explicitly
    pub fn default_success(&self) -> bool {
        !matches!(
            self,
            Self::AuthLoginFailure
                | Self::SecurityPermissionDenied
                | Self::SecuritySuspiciousActivity
                | Self::SecurityRateLimitAbuse
        )
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|event_type| event_type.as_str() == s)
            .ok_or_else(|| DomainError::Serialization {
                message: format!("unknown audit event type '{}'", s),
            })
    }
}

/// Event submitted to an audit store; the store assigns id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    pub details: AuditDetails,
    pub success: bool,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            user_id: None,
            username: None,
            ip_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
            details: AuditDetails::new(),
            success: event_type.default_success(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Copy IP address and user agent from the request, keeping "unknown" for blanks
    pub fn with_request_context(mut self, context: &RequestContext) -> Self {
        self.ip_address = context.ip_address().to_string();
        self.user_agent = context.user_agent().to_string();
        self
    }

    /// Replace the payload with any serializable value
    ///
    /// Values that do not serialize to a JSON object are dropped with a
    /// warning and the event is stored with an empty payload.
    pub fn with_details<T: Serialize + ?Sized>(mut self, details: &T) -> Self {
        self.details = match serde_json::to_value(details) {
            Ok(JsonValue::Object(map)) => map,
            Ok(JsonValue::Null) => AuditDetails::new(),
            Ok(other) => {
                warn!(
                    event_type = %self.event_type,
                    kind = json_kind(&other),
                    "Audit details are not an object, storing empty details"
                );
                AuditDetails::new()
            }
            Err(e) => {
                warn!(
                    event_type = %self.event_type,
                    error = %e,
                    "Audit details failed to serialize, storing empty details"
                );
                AuditDetails::new()
            }
        };
        self
    }

    /// Add a single payload entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = success;
        self
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Stored audit record; immutable once written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    /// Strictly increasing identifier assigned by the store
    pub id: i64,
    pub event_type: AuditEventType,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub ip_address: String,
    pub user_agent: String,
    /// Instant the store accepted the event
    pub timestamp: DateTime<Utc>,
    pub details: AuditDetails,
    pub success: bool,
}

impl AuditLogEntry {
    pub fn from_event(id: i64, timestamp: DateTime<Utc>, event: AuditEvent) -> Self {
        Self {
            id,
            event_type: event.event_type,
            user_id: event.user_id,
            username: event.username,
            ip_address: event.ip_address,
            user_agent: event.user_agent,
            timestamp,
            details: event.details,
            success: event.success,
        }
    }

    /// Newest first, ties broken by id
    pub fn newest_first(a: &Self, b: &Self) -> std::cmp::Ordering {
        b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id))
    }
}

/// Filters for retrieving audit entries; all set filters must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub event_type: Option<AuditEventType>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub success: Option<bool>,
    /// Inclusive lower bound on the entry timestamp
    pub start_date: Option<DateTime<Utc>>,
    pub limit: usize,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            event_type: None,
            user_id: None,
            username: None,
            success: None,
            start_date: None,
            limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: AuditEventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn since(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Failed events, optionally for one username
    pub fn recent_failures(username: Option<&str>, limit: usize) -> Self {
        let query = Self::new().success(false).limit(limit);
        match username {
            Some(name) => query.username(name),
            None => query,
        }
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(event_type) = self.event_type {
            if entry.event_type != event_type {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if entry.user_id.as_deref() != Some(user_id.as_str()) {
                return false;
            }
        }
        if let Some(ref username) = self.username {
            if entry.username.as_deref() != Some(username.as_str()) {
                return false;
            }
        }
        if let Some(success) = self.success {
            if entry.success != success {
                return false;
            }
        }
        if let Some(start) = self.start_date {
            if entry.timestamp < start {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts across the whole store
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditStatistics {
    pub total_logs: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Percentage of successful events, 0 when the store is empty
    pub success_rate: f64,
    pub event_type_counts: BTreeMap<String, u64>,
}

impl AuditStatistics {
    /// Build from raw counts; the failure count is derived
    pub fn from_counts(
        total_logs: u64,
        success_count: u64,
        event_type_counts: BTreeMap<String, u64>,
    ) -> Self {
        let success_rate = if total_logs == 0 {
            0.0
        } else {
            success_count as f64 / total_logs as f64 * 100.0
        };
        Self {
            total_logs,
            success_count,
            failure_count: total_logs.saturating_sub(success_count),
            success_rate,
            event_type_counts,
        }
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a AuditLogEntry>) -> Self {
        let mut total = 0u64;
        let mut successes = 0u64;
        let mut counts = BTreeMap::new();
        for entry in entries {
            total += 1;
            if entry.success {
                successes += 1;
            }
            *counts.entry(entry.event_type.as_str().to_string()).or_insert(0) += 1;
        }
        Self::from_counts(total, successes, counts)
    }

    pub fn count_for(&self, event_type: AuditEventType) -> u64 {
        self.event_type_counts
            .get(event_type.as_str())
            .copied()
            .unwrap_or(0)
    }
}
