//! A small fixed-size pool of libSQL connections.
//!
//! libSQL's local `Database` hands out independent `SQLite` connections. Writers
//! serialize on the database lock, so concurrent requests each need their own
//! connection; the pool caps how many exist and parks callers on a semaphore
//! when all of them are checked out.

use std::ops::Deref;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::DatabaseError;

/// Per-connection settings applied when a connection is opened.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub busy_timeout: Duration,
    pub wal: bool,
}

pub struct ConnectionPool {
    db: libsql::Database,
    idle: Arc<Mutex<Vec<libsql::Connection>>>,
    permits: Arc<Semaphore>,
    settings: ConnectionSettings,
    size: usize,
}

impl ConnectionPool {
    /// Open `size` connections against `db`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a connection cannot be opened or configured.
    pub async fn new(
        db: libsql::Database,
        size: usize,
        settings: ConnectionSettings,
    ) -> Result<Self, DatabaseError> {
        let size = size.max(1);
        let mut conns = Vec::with_capacity(size);
        for _ in 0..size {
            conns.push(open_connection(&db, settings).await?);
        }
        tracing::debug!(size, wal = settings.wal, "connection pool ready");
        Ok(Self {
            db,
            idle: Arc::new(Mutex::new(conns)),
            permits: Arc::new(Semaphore::new(size)),
            settings,
            size,
        })
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Check out a connection, waiting if all are in use.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Pool` if the pool was closed, or `DatabaseError`
    /// if a replacement connection cannot be opened.
    pub async fn acquire(&self) -> Result<PooledConnection, DatabaseError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        let parked = self.idle.lock().ok().and_then(|mut idle| idle.pop());
        let conn = match parked {
            Some(conn) => conn,
            // A guard dropped while the idle list was poisoned loses its
            // connection; open a fresh one in its place.
            None => open_connection(&self.db, self.settings).await?,
        };

        // A connection must not be handed out mid-transaction.
        if !conn.is_autocommit() {
            tracing::warn!("pooled connection returned with an open transaction, rolling back");
            conn.execute("ROLLBACK", ()).await?;
        }

        Ok(PooledConnection {
            conn,
            idle: Arc::clone(&self.idle),
            _permit: permit,
        })
    }
}

async fn open_connection(
    db: &libsql::Database,
    settings: ConnectionSettings,
) -> Result<libsql::Connection, DatabaseError> {
    let conn = db.connect()?;

    // Foreign keys are per-connection in SQLite.
    conn.execute("PRAGMA foreign_keys = ON", ())
        .await
        .map_err(|e| DatabaseError::Pool(format!("PRAGMA foreign_keys: {e}")))?;

    // Both pragmas report their new value as a row, so go through `query`.
    let ms = settings.busy_timeout.as_millis();
    conn.query(&format!("PRAGMA busy_timeout = {ms}"), ())
        .await
        .map_err(|e| DatabaseError::Pool(format!("PRAGMA busy_timeout: {e}")))?;
    if settings.wal {
        conn.query("PRAGMA journal_mode = WAL", ())
            .await
            .map_err(|e| DatabaseError::Pool(format!("PRAGMA journal_mode: {e}")))?;
    }

    Ok(conn)
}

/// A checked-out connection. Returns to the pool on drop.
pub struct PooledConnection {
    conn: libsql::Connection,
    idle: Arc<Mutex<Vec<libsql::Connection>>>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        // The permit is released after this runs, so the connection is back
        // in the idle list before the next waiter wakes.
        if let Ok(mut idle) = self.idle.lock() {
            idle.push(self.conn.clone());
        }
    }
}
