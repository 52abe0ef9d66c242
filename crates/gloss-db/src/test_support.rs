//! Shared test utilities for gloss-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use std::path::Path;

    use gloss_config::DatabaseConfig;

    use crate::GlossDb;
    use crate::service::GlossService;

    /// Create an in-memory `GlossService` (single connection).
    pub async fn test_service() -> GlossService {
        let db = GlossDb::open_local(":memory:").await.unwrap();
        GlossService::from_db(db)
    }

    /// Create a file-backed `GlossService` with `pool_size` connections, for
    /// tests that need real concurrent writers.
    pub async fn file_service(dir: &Path, pool_size: usize) -> GlossService {
        let db = GlossDb::open(&DatabaseConfig {
            path: dir.join("glossary.db").to_string_lossy().into_owned(),
            pool_size,
            busy_timeout_ms: 5_000,
        })
        .await
        .unwrap();
        GlossService::from_db(db)
    }

    /// Insert a bare term row directly, bypassing the entry store.
    pub async fn insert_bare_entry(svc: &GlossService, id: &str, title: &str) {
        let conn = svc.db().acquire().await.unwrap();
        conn.execute(
            "INSERT INTO entries (id, title, title_key, type) VALUES (?1, ?2, ?3, 'term')",
            libsql::params![id, title, gloss_core::mentions::title_key(title)],
        )
        .await
        .unwrap();
    }

    pub async fn count_rows(svc: &GlossService, table: &str) -> i64 {
        let conn = svc.db().acquire().await.unwrap();
        let mut rows = conn
            .query(&format!("SELECT count(*) FROM {table}"), ())
            .await
            .unwrap();
        rows.next().await.unwrap().unwrap().get::<i64>(0).unwrap()
    }
}
