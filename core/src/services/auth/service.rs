//! Login guard coordinating lockout tracking with audit logging
//!
//! A login handler calls [`LoginGuard::check`] before verifying credentials,
//! then exactly one of [`LoginGuard::record_failure`] or
//! [`LoginGuard::record_success`] with the outcome.

use std::sync::Arc;

use rw_shared::AuditFailurePolicy;
use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::domain::entities::audit::{AuditEvent, AuditEventType};
use crate::domain::entities::lock::remaining_minutes;
use crate::domain::value_objects::{LoginFailureOutcome, RequestContext};
use crate::errors::{AuthError, DomainResult};
use crate::repositories::AuditStore;
use crate::services::monitor::SecurityMonitor;

use super::attempt_tracker::AttemptTracker;

/// Reason attached to failures recorded while the account was already locked
pub const ACCOUNT_LOCKED_REASON: &str = "account_locked";

/// Login control flow over the attempt tracker, audit store and security monitor
pub struct LoginGuard<S: AuditStore + ?Sized> {
    tracker: Arc<AttemptTracker>,
    store: Arc<S>,
    monitor: Arc<SecurityMonitor<S>>,
    policy: AuditFailurePolicy,
}

impl<S: AuditStore + ?Sized> LoginGuard<S> {
    pub fn new(
        tracker: Arc<AttemptTracker>,
        store: Arc<S>,
        monitor: Arc<SecurityMonitor<S>>,
        policy: AuditFailurePolicy,
    ) -> Self {
        Self {
            tracker,
            store,
            monitor,
            policy,
        }
    }

    pub fn policy(&self) -> AuditFailurePolicy {
        self.policy
    }

    pub fn tracker(&self) -> &AttemptTracker {
        &self.tracker
    }

    /// Reject the attempt up front when the account is locked
    pub fn check(&self, identity: &str) -> Result<(), AuthError> {
        match self.tracker.lock_info(identity) {
            Some(account) => Err(AuthError::AccountLocked {
                minutes: account.remaining_minutes,
                unlock_at: account.unlock_at,
            }),
            None => Ok(()),
        }
    }

    /// Record a failed login, audit it and report the lock state
    pub async fn record_failure(
        &self,
        identity: &str,
        context: &RequestContext,
    ) -> DomainResult<LoginFailureOutcome> {
        let record = self.tracker.record_failure(identity);
        let remaining_attempts = self.tracker.get_remaining_attempts(identity);
        let locked = record.locked_until.is_some();
        let now = self.tracker.clock().now();

        let mut event = AuditEvent::new(AuditEventType::AuthLoginFailure)
            .with_username(identity)
            .with_request_context(context)
            .with_detail("remaining_attempts", remaining_attempts)
            .with_detail("locked", locked);
        if let Some(unlock_at) = record.locked_until {
            event = event.with_detail("unlock_at", unlock_at.to_rfc3339());
        }
        if locked && !record.newly_locked {
            event = event.with_detail("reason", ACCOUNT_LOCKED_REASON);
        }

        let audit_id = self.apply_policy(self.store.log_event(event).await, identity)?;

        if let (true, Some(unlock_at)) = (record.newly_locked, record.locked_until) {
            let observed = self
                .monitor
                .observe_lockout(identity, unlock_at, context)
                .await;
            self.apply_policy(observed.map(|_| ()), identity)?;
        }

        Ok(LoginFailureOutcome {
            remaining_attempts,
            locked,
            unlock_at: record.locked_until,
            remaining_minutes: record
                .locked_until
                .map(|unlock_at| remaining_minutes(unlock_at, now)),
            newly_locked: record.newly_locked,
            audit_id,
        })
    }

    /// Audit a successful login and clear the identity's failure history
    ///
    /// Under a fail-closed policy a failed audit write leaves the history in
    /// place and returns the storage error.
    pub async fn record_success(
        &self,
        identity: &str,
        user_id: Option<&str>,
        context: &RequestContext,
    ) -> DomainResult<Option<i64>> {
        let mut event = AuditEvent::new(AuditEventType::AuthLoginSuccess)
            .with_username(identity)
            .with_request_context(context);
        if let Some(user_id) = user_id {
            event = event.with_user_id(user_id);
        }

        let audit_id = self.apply_policy(self.store.log_event(event).await, identity)?;
        self.tracker.clear_attempts(identity);
        info!(identity, "Successful login recorded");
        Ok(audit_id)
    }

    fn apply_policy<T>(&self, result: DomainResult<T>, identity: &str) -> DomainResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) => match self.policy {
                AuditFailurePolicy::FailClosed => {
                    warn!(identity, error = %e, "Audit write failed, rejecting login flow");
                    Err(e)
                }
                AuditFailurePolicy::FailOpen => {
                    error!(identity, error = %e, "Audit write failed, continuing login flow");
                    Ok(None)
                }
            },
        }
    }
}
