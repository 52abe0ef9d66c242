//! # gloss-db
//!
//! libSQL storage for the glossary: entries, tags, the entry reference graph,
//! the public submission queue, and the audit trail.
//!
//! Every mutation runs inside one IMMEDIATE transaction taken from a small
//! connection pool. Reference maintenance and tag resolution are free
//! functions over a `libsql::Connection` so the moderation applier can run
//! them inside its own transaction alongside the status change.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29).

pub mod error;
pub mod helpers;
mod migrations;
pub mod pool;
pub mod repos;
pub mod retry;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::ops::Deref;
use std::path::Path;
use std::time::Duration;

use gloss_config::DatabaseConfig;
use libsql::{Builder, TransactionBehavior};

use error::DatabaseError;
use pool::{ConnectionPool, ConnectionSettings, PooledConnection};
use retry::{RetryConfig, retry_busy};

/// Central database handle for all glossary state.
///
/// Wraps a libSQL database behind a connection pool. Provides transactions
/// and ID generation; repository methods live on [`service::GlossService`].
pub struct GlossDb {
    pool: ConnectionPool,
    retry: RetryConfig,
}

impl GlossDb {
    /// Open the database described by `config`.
    ///
    /// Creates the parent directory of a file-backed database if needed and
    /// runs migrations on open. `:memory:` databases always get a single
    /// connection, since every in-memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let in_memory = config.is_in_memory();
        if !in_memory {
            if let Some(parent) = Path::new(&config.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(anyhow::anyhow!(
                            "creating database directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
        }

        let db = Builder::new_local(&config.path).build().await?;
        let pool = ConnectionPool::new(
            db,
            config.effective_pool_size(),
            ConnectionSettings {
                busy_timeout: Duration::from_millis(config.busy_timeout_ms),
                wal: !in_memory,
            },
        )
        .await?;

        let gloss_db = Self {
            pool,
            retry: RetryConfig::default(),
        };
        gloss_db.run_migrations().await?;
        tracing::debug!(path = %config.path, pool = gloss_db.pool.size(), "database opened");
        Ok(gloss_db)
    }

    /// Open a local database at `path` with default pool settings.
    ///
    /// # Errors
    ///
    /// Same as [`GlossDb::open`].
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open(&DatabaseConfig {
            path: path.to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Check out a connection for reads or ad-hoc statements.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Pool` if the pool is closed.
    pub async fn acquire(&self) -> Result<PooledConnection, DatabaseError> {
        self.pool.acquire().await
    }

    /// Begin an IMMEDIATE transaction on a pooled connection.
    ///
    /// IMMEDIATE takes the writer lock up front, so two writers never both
    /// read a snapshot and then race to upgrade.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the lock cannot be taken after retries.
    pub async fn begin(&self) -> Result<PooledTransaction, DatabaseError> {
        let conn = self.acquire().await?;
        let raw: &libsql::Connection = &conn;
        let tx = retry_busy(&self.retry, || {
            raw.transaction_with_behavior(TransactionBehavior::Immediate)
        })
        .await?;
        Ok(PooledTransaction { tx, _conn: conn })
    }
}

/// Generate a prefixed ID on an existing connection or transaction.
///
/// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails or returns no rows.
pub async fn generate_id(conn: &libsql::Connection, prefix: &str) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query("SELECT ?1 || '-' || lower(hex(randomblob(4)))", [prefix])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<String>(0)?)
}

/// An open transaction that keeps its pooled connection checked out.
///
/// Dropping it without [`commit`](Self::commit) rolls back.
pub struct PooledTransaction {
    tx: libsql::Transaction,
    _conn: PooledConnection,
}

impl PooledTransaction {
    /// # Errors
    ///
    /// Returns `DatabaseError` if `COMMIT` fails.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if `ROLLBACK` fails.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        Ok(())
    }

    /// Commit if `result` is `Ok`, roll back otherwise, and hand `result` back.
    ///
    /// A failed rollback is logged; the original error wins.
    ///
    /// # Errors
    ///
    /// Returns the error in `result`, or the commit error.
    pub async fn finish<T>(self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.rollback().await {
                    tracing::warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

impl Deref for PooledTransaction {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.tx
    }
}
