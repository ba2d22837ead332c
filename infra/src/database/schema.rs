//! Audit log table and indexes

use sqlx::SqlitePool;

use crate::InfrastructureError;

// The timestamp default produces the same fixed-width text the store binds,
// e.g. 2026-01-15T08:00:00.123000Z, so defaulted rows sort by time too
const CREATE_AUDIT_LOGS: &str = r#"
    CREATE TABLE IF NOT EXISTS audit_logs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        event_type TEXT NOT NULL,
        user_id TEXT NULL,
        username TEXT NULL,
        ip_address TEXT DEFAULT 'unknown',
        user_agent TEXT DEFAULT 'unknown',
        timestamp TEXT DEFAULT (strftime('%Y-%m-%dT%H:%M:%S', 'now')
            || substr(strftime('%f', 'now'), 3) || '000Z'),
        details TEXT DEFAULT '{}',
        success INTEGER DEFAULT 1
    )
"#;

const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_timestamp ON audit_logs (timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_event_type ON audit_logs (event_type)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_username ON audit_logs (username)",
    "CREATE INDEX IF NOT EXISTS idx_audit_logs_user_id ON audit_logs (user_id)",
];

/// Create the audit table and its indexes if they do not exist
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), InfrastructureError> {
    tracing::debug!("Ensuring audit log schema");

    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_AUDIT_LOGS).execute(&mut *tx).await?;
    for statement in CREATE_INDEXES {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!("Audit log schema ready");
    Ok(())
}
