//! Explicitly constructed container for the security components
//!
//! One [`SecurityCore`] is built at startup and handed to request handlers.
//! All components share the same clock and audit store.

use std::sync::Arc;

use rw_shared::SecurityConfig;
use tracing::{info, warn};

use crate::clock::SharedClock;
use crate::domain::value_objects::RequestContext;
use crate::errors::{AuthError, DomainError, DomainResult};
use crate::repositories::AuditStore;
use crate::services::auth::{AttemptTracker, LoginGuard, RateLimiter};
use crate::services::monitor::SecurityMonitor;

/// Security services sharing one clock and one audit store
pub struct SecurityCore<S: AuditStore + ?Sized> {
    config: SecurityConfig,
    clock: SharedClock,
    store: Arc<S>,
    tracker: Arc<AttemptTracker>,
    limiter: Arc<RateLimiter>,
    monitor: Arc<SecurityMonitor<S>>,
    guard: LoginGuard<S>,
}

impl<S: AuditStore + ?Sized> SecurityCore<S> {
    /// Validate `config` and wire every component around `store` and `clock`
    pub fn init(config: SecurityConfig, store: Arc<S>, clock: SharedClock) -> DomainResult<Self> {
        config.validate()?;

        let tracker = Arc::new(AttemptTracker::new(config.login.clone(), clock.clone()));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone(), clock.clone()));
        let monitor = Arc::new(SecurityMonitor::new(
            store.clone(),
            config.monitor.clone(),
            clock.clone(),
        ));
        let guard = LoginGuard::new(
            tracker.clone(),
            store.clone(),
            monitor.clone(),
            config.audit.failure_policy,
        );

        info!(
            environment = %config.environment,
            max_attempts = config.login.max_attempts,
            failure_policy = ?config.audit.failure_policy,
            "Security core initialized"
        );

        Ok(Self {
            config,
            clock,
            store,
            tracker,
            limiter,
            monitor,
            guard,
        })
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn tracker(&self) -> &Arc<AttemptTracker> {
        &self.tracker
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn monitor(&self) -> &Arc<SecurityMonitor<S>> {
        &self.monitor
    }

    pub fn login_guard(&self) -> &LoginGuard<S> {
        &self.guard
    }

    /// Gate one outbound call to `api` with its configured limit
    ///
    /// Rejections are counted by the security monitor and returned as
    /// [`AuthError::RateLimitExceeded`].
    pub async fn throttle(&self, api: &str, context: &RequestContext) -> DomainResult<()> {
        let limit = self.limiter.limit_for(api);
        if self
            .monitor
            .guard_request(&self.limiter, api, limit, context)
            .await?
        {
            return Ok(());
        }
        Err(DomainError::Auth(AuthError::RateLimitExceeded {
            retry_after_seconds: self.limiter.get_wait_time(api),
        }))
    }

    /// Close the audit store
    pub async fn shutdown(&self) -> DomainResult<()> {
        let locked = self.tracker.get_locked_accounts().len();
        match self.store.close().await {
            Ok(()) => {
                info!(locked_accounts = locked, "Security core shut down");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Audit store did not close cleanly");
                Err(e)
            }
        }
    }
}
