//! Database configuration module

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};

/// Database configuration for the SQLite audit store
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL (e.g. `sqlite://data/audit.db` or `sqlite::memory:`)
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    pub connect_timeout: u64,

    /// How long a writer waits on a locked database, in seconds
    pub busy_timeout: u64,

    /// Create the database file when it does not exist
    pub create_if_missing: bool,

    /// Enable SQL statement logging
    pub enable_logging: bool,

    /// Slow query threshold in milliseconds
    pub slow_query_threshold: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite://data/releasewatch.db"),
            max_connections: 5,
            connect_timeout: 30,
            busy_timeout: 5,
            create_if_missing: true,
            enable_logging: false,
            slow_query_threshold: default_slow_query_threshold(),
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Configuration for a private in-memory database
    pub fn in_memory() -> Self {
        Self::new("sqlite::memory:")
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Enable SQL statement logging
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }

    /// Whether the URL points at an in-memory database
    ///
    /// Every pooled connection to `:memory:` opens its own database, so the
    /// pool has to be pinned to a single long-lived connection.
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    /// Validate the database settings
    pub fn validate(&self) -> ConfigResult<()> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "database.url".to_string(),
            });
        }
        if !self.url.starts_with("sqlite:") {
            return Err(ConfigError::invalid(
                "database.url",
                format!("expected a sqlite: URL, got {}", self.url),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_slow_query_threshold() -> u64 {
    1000 // 1 second
}
