//! Composite security alerting
//!
//! The monitor keeps its own per-(kind, key) violation counters, separate
//! from the limiter's and tracker's accounting, and turns a burst of
//! violations into a single high-severity audit event.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use rw_shared::{MonitorConfig, MonitorRule};
use tracing::{error, warn};

use crate::clock::{Clock, SharedClock};
use crate::domain::entities::audit::{AuditDetails, AuditEvent, AuditEventType};
use crate::domain::entities::violation::{ViolationKind, ViolationRecord};
use crate::domain::value_objects::RequestContext;
use crate::errors::DomainResult;
use crate::repositories::AuditStore;
use crate::services::auth::RateLimiter;
use crate::sync::lock;

/// Reason recorded on suspicious-activity alerts raised by repeated lockouts
pub const REPEATED_LOCKOUT_REASON: &str = "repeated_lockout";

type CounterKey = (ViolationKind, String);

/// Correlates repeated violations into composite audit events
pub struct SecurityMonitor<S: AuditStore + ?Sized> {
    store: Arc<S>,
    config: MonitorConfig,
    clock: SharedClock,
    counters: Mutex<HashMap<CounterKey, ViolationRecord>>,
}

impl<S: AuditStore + ?Sized> SecurityMonitor<S> {
    pub fn new(store: Arc<S>, config: MonitorConfig, clock: SharedClock) -> Self {
        Self {
            store,
            config,
            clock,
            counters: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_defaults(store: Arc<S>, clock: SharedClock) -> Self {
        Self::new(store, MonitorConfig::default(), clock)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn rule(&self, kind: ViolationKind) -> MonitorRule {
        match kind {
            ViolationKind::RateLimit => self.config.rate_limit,
            ViolationKind::Lockout => self.config.lockout,
        }
    }

    fn window(&self, kind: ViolationKind) -> Duration {
        Duration::seconds(self.rule(kind).window_seconds as i64)
    }

    /// Count one violation and emit a composite event when the threshold is reached
    ///
    /// # Returns
    /// * `Ok(Some(id))` when this violation raised an alert
    /// * `Ok(None)` when it was only counted
    /// * `Err(DomainError::Storage)` if the alert could not be written; the
    ///   counter is left so that the next violation retries the alert
    pub async fn record_violation(
        &self,
        kind: ViolationKind,
        key: &str,
        context: &RequestContext,
    ) -> DomainResult<Option<i64>> {
        self.record(kind, key, context, AuditDetails::new()).await
    }

    /// Record a rate limit rejection for `key` if the limiter refuses the request
    ///
    /// # Returns
    /// * `Ok(true)` when the request is allowed
    /// * `Ok(false)` when it was rejected and counted as a violation
    pub async fn guard_request(
        &self,
        limiter: &RateLimiter,
        key: &str,
        limit_per_minute: u32,
        context: &RequestContext,
    ) -> DomainResult<bool> {
        if limiter.is_allowed(key, limit_per_minute) {
            return Ok(true);
        }
        self.record_violation(ViolationKind::RateLimit, key, context)
            .await?;
        Ok(false)
    }

    /// Count an account lockout for `identity`
    pub async fn observe_lockout(
        &self,
        identity: &str,
        unlock_at: DateTime<Utc>,
        context: &RequestContext,
    ) -> DomainResult<Option<i64>> {
        let mut extra = AuditDetails::new();
        extra.insert("unlock_at".to_string(), unlock_at.to_rfc3339().into());
        self.record(ViolationKind::Lockout, identity, context, extra)
            .await
    }

    async fn record(
        &self,
        kind: ViolationKind,
        key: &str,
        context: &RequestContext,
        extra: AuditDetails,
    ) -> DomainResult<Option<i64>> {
        let now = self.clock.now();
        let rule = self.rule(kind);
        let window = self.window(kind);

        // Decide under the lock, write to the store after releasing it
        let alert = {
            let mut counters = lock(&self.counters);
            self.prune(&mut counters, now);

            let record = counters
                .entry((kind, key.to_string()))
                .or_insert_with(|| ViolationRecord::new(kind, key, now));
            record.observe(now, window);

            let cooled_down = record
                .alerted_at
                .map_or(true, |alerted| now - alerted >= window);
            if record.count >= rule.threshold && cooled_down {
                let snapshot = record.clone();
                record.clear_recent();
                record.alerted_at = Some(now);
                Some(snapshot)
            } else {
                None
            }
        };

        let Some(snapshot) = alert else {
            return Ok(None);
        };

        let event = self.alert_event(&snapshot, rule, context, extra);
        match self.store.log_event(event).await {
            Ok(id) => {
                warn!(
                    kind = %kind,
                    key,
                    violations = snapshot.count,
                    window_seconds = rule.window_seconds,
                    audit_id = id,
                    "Composite security alert raised"
                );
                Ok(Some(id))
            }
            Err(e) => {
                error!(kind = %kind, key, error = %e, "Failed to store security alert");
                self.restore(snapshot);
                Err(e)
            }
        }
    }

    fn alert_event(
        &self,
        record: &ViolationRecord,
        rule: MonitorRule,
        context: &RequestContext,
        extra: AuditDetails,
    ) -> AuditEvent {
        let event = match record.kind {
            ViolationKind::RateLimit => AuditEvent::new(AuditEventType::SecurityRateLimitAbuse)
                .with_detail("key", record.key.as_str()),
            ViolationKind::Lockout => AuditEvent::new(AuditEventType::SecuritySuspiciousActivity)
                .with_username(record.key.as_str())
                .with_detail("reason", REPEATED_LOCKOUT_REASON),
        };

        let mut event = event
            .with_request_context(context)
            .with_detail("violations", record.count)
            .with_detail("window_seconds", rule.window_seconds)
            .with_detail("first_seen", record.first_seen.to_rfc3339())
            .with_detail("total_violations", record.total);
        event.details.extend(extra);
        event
    }

    /// Put back the burst an unsent alert consumed
    fn restore(&self, snapshot: ViolationRecord) {
        let mut counters = lock(&self.counters);
        match counters.get_mut(&(snapshot.kind, snapshot.key.clone())) {
            Some(current) => {
                current.merge_unreported(&snapshot.recent);
                current.alerted_at = snapshot.alerted_at;
            }
            None => {
                counters.insert((snapshot.kind, snapshot.key.clone()), snapshot);
            }
        }
    }

    fn prune(&self, counters: &mut HashMap<CounterKey, ViolationRecord>, now: DateTime<Utc>) {
        counters.retain(|(kind, _), record| {
            let window = self.window(*kind);
            record.expire(now, window);
            let cooling = record.alerted_at.map_or(false, |alerted| now - alerted < window);
            record.count > 0 || cooling
        });
    }

    /// Copy of every live counter, ordered by kind then key
    pub fn violation_snapshot(&self) -> Vec<ViolationRecord> {
        let now = self.clock.now();
        let mut counters = lock(&self.counters);
        self.prune(&mut counters, now);
        let mut records: Vec<ViolationRecord> = counters.values().cloned().collect();
        records.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.key.cmp(&b.key)));
        records
    }

    /// Forget the counter for (`kind`, `key`); returns whether one existed
    pub fn reset(&self, kind: ViolationKind, key: &str) -> bool {
        lock(&self.counters)
            .remove(&(kind, key.to_string()))
            .is_some()
    }
}
