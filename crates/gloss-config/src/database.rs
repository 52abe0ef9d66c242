//! libSQL database configuration.

use serde::{Deserialize, Serialize};

/// Default database path (project-local).
fn default_path() -> String {
    ".glossary/glossary.db".to_string()
}

/// Default number of pooled connections.
const fn default_pool_size() -> usize {
    4
}

/// Default time a connection waits on a locked database, in milliseconds.
const fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the libSQL database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// Number of connections opened up front. Forced to 1 for `:memory:`.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// `PRAGMA busy_timeout` applied to every pooled connection.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            pool_size: default_pool_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory databases live and die with a single connection.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }

    /// Pool size after accounting for in-memory databases.
    #[must_use]
    pub fn effective_pool_size(&self) -> usize {
        if self.is_in_memory() {
            1
        } else {
            self.pool_size.max(1)
        }
    }

    /// Config for a throwaway in-memory database (tests, dry runs).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: ":memory:".to_string(),
            ..Self::default()
        }
    }
}
