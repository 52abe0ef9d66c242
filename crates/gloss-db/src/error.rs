//! Database error types for gloss-db.

use gloss_core::enums::EntityType;
use gloss_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The referenced entry, tag, or submission does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityType, id: String },

    /// A submission is not in a state that allows the requested move.
    #[error("Invalid state transition: {entity} {id} from {from} to {to}")]
    InvalidTransition {
        entity: EntityType,
        id: String,
        from: String,
        to: String,
    },

    /// A write collided with an existing row (duplicate id or tag name).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input was rejected before anything was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Stored data contradicts what a just-completed write guarantees.
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// A SQL query failed or returned something unparseable.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// The connection pool is closed or a connection could not be prepared.
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: EntityType, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Map a failed INSERT, turning uniqueness violations into [`Self::Conflict`].
    pub(crate) fn from_insert(e: libsql::Error, what: impl FnOnce() -> String) -> Self {
        if is_unique_violation(&e) {
            Self::Conflict(what())
        } else {
            Self::LibSql(e)
        }
    }
}

/// Detect `UNIQUE` and `PRIMARY KEY` constraint failures.
///
/// libSQL surfaces both as `SqliteFailure` with the constraint name in the
/// message; the extended result code is not exposed uniformly across
/// backends, so match on the text.
pub fn is_unique_violation(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("PRIMARY KEY constraint failed")
}

/// Detect a writer lock held by another connection.
pub fn is_busy_error(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("database is locked") || msg.contains("database table is locked")
}

impl From<CoreError> for DatabaseError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::Other(e) => Self::Other(e),
        }
    }
}
