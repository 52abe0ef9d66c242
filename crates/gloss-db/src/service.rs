//! Service layer orchestrating database mutations with audit.
//!
//! `GlossService` wraps `GlossDb`. All repo methods are implemented as
//! `impl GlossService`; the pieces that must also run inside someone else's
//! transaction (reference maintenance, tag resolution, entry writes) are free
//! functions over a `libsql::Connection` in their repo modules.

use gloss_config::GlossConfig;

use crate::GlossDb;
use crate::error::DatabaseError;

/// Orchestrates database mutations with the audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Begin an IMMEDIATE transaction
/// 2. Execute SQL
/// 3. Append audit entry (inside transaction)
/// 4. Commit, or roll back on any error
pub struct GlossService {
    db: GlossDb,
    default_limit: u32,
}

impl GlossService {
    /// Create a new service wrapping a local database with default settings.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = GlossDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open(config: &GlossConfig) -> Result<Self, DatabaseError> {
        let db = GlossDb::open(&config.database).await?;
        Ok(Self {
            db,
            default_limit: config.general.default_limit,
        })
    }

    /// Create from an existing `GlossDb` (for testing).
    #[must_use]
    pub fn from_db(db: GlossDb) -> Self {
        Self {
            db,
            default_limit: gloss_config::GeneralConfig::default().default_limit,
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &GlossDb {
        &self.db
    }

    /// Row cap for list queries when the caller does not give one.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.default_limit
    }

    pub(crate) fn limit_or_default(&self, limit: Option<u32>) -> u32 {
        limit.unwrap_or(self.default_limit)
    }
}
