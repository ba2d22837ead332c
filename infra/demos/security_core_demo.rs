//! Walks one account through lockout and prints the resulting audit trail
//!
//! Run with:
//! ```bash
//! cargo run -p rw_infra --example security_core_demo
//! ```
//!
//! Set `RW_AUDIT__BACKEND=sqlite` and `RW_DATABASE__URL=sqlite://demo.db`
//! to keep the trail on disk.

use anyhow::Context;
use rw_core::{AuditQuery, AuditStore, RequestContext, MAX_ATTEMPTS};
use rw_infra::{init_telemetry, initialize, load_config};
use rw_shared::AuditBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = load_config(None).context("loading configuration")?;
    if std::env::var("RW_AUDIT__BACKEND").is_err() {
        config.audit.backend = AuditBackend::Memory;
    }
    init_telemetry(&config.logging);

    let core = initialize(config).await.context("starting security core")?;
    let ctx = RequestContext::new(Some("192.0.2.1"), Some("demo-client"));
    let guard = core.login_guard();

    for _ in 0..MAX_ATTEMPTS {
        let outcome = guard.record_failure("demo-user", &ctx).await?;
        println!(
            "failure recorded: remaining={} locked={}",
            outcome.remaining_attempts, outcome.locked
        );
    }

    if let Err(e) = guard.check("demo-user") {
        println!("login refused: {}", e);
    }

    for api in ["anilist", "gmail"] {
        match core.throttle(api, &ctx).await {
            Ok(()) => println!("{} call allowed", api),
            Err(e) => println!("{} call refused: {}", api, e),
        }
    }

    let stats = core.store().get_statistics().await?;
    println!(
        "audit entries: {} ({} failed, {:.1}% success)",
        stats.total_logs, stats.failure_count, stats.success_rate
    );
    for entry in core.store().get_logs(&AuditQuery::new().limit(3)).await? {
        println!("#{} {} {:?}", entry.id, entry.event_type, entry.details);
    }

    core.shutdown().await?;
    Ok(())
}
