//! Tag registry: name-to-id resolution with insert-then-reselect.
//!
//! Tag names are unique. Two saves may want the same new tag at once, so
//! resolution never trusts its own first read: it inserts whatever looked
//! missing with `ON CONFLICT DO NOTHING` and then reads every requested name
//! back. Whichever writer created the row, both end up with its id.

use std::collections::HashMap;

use gloss_core::entities::{Tag, TagUsage};
use gloss_core::enums::{AuditAction, EntityType};

use crate::error::DatabaseError;
use crate::helpers::{dedupe_preserving_order, placeholders};
use crate::repos::audit::append_audit;
use crate::service::GlossService;

/// Trim, drop blanks, and dedupe requested names. Case is significant.
fn normalize_names(names: &[String]) -> Vec<String> {
    dedupe_preserving_order(
        names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    )
}

async fn select_by_name(
    conn: &libsql::Connection,
    names: &[String],
) -> Result<HashMap<String, i64>, DatabaseError> {
    let sql = format!(
        "SELECT id, name FROM tags WHERE name IN ({})",
        placeholders(1, names.len())
    );
    let mut rows = conn
        .query(&sql, libsql::params_from_iter(names.iter().cloned()))
        .await?;

    let mut found = HashMap::new();
    while let Some(row) = rows.next().await? {
        found.insert(row.get::<String>(1)?, row.get::<i64>(0)?);
    }
    Ok(found)
}

/// Resolve tag names to rows, creating the ones that do not exist yet.
///
/// Returns one [`Tag`] per distinct non-blank name, in first-seen order.
/// Runs on the caller's transaction.
///
/// # Errors
///
/// Returns `DatabaseError::DataIntegrity` if a name is still missing after
/// the insert, or `DatabaseError` if a statement fails.
pub async fn ensure_tags_exist(
    conn: &libsql::Connection,
    names: &[String],
) -> Result<Vec<Tag>, DatabaseError> {
    let wanted = normalize_names(names);
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let mut found = select_by_name(conn, &wanted).await?;
    let missing: Vec<String> = wanted
        .iter()
        .filter(|n| !found.contains_key(*n))
        .cloned()
        .collect();

    if !missing.is_empty() {
        let values = (1..=missing.len())
            .map(|i| format!("(?{i})"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("INSERT INTO tags (name) VALUES {values} ON CONFLICT(name) DO NOTHING");
        let inserted = conn
            .execute(&sql, libsql::params_from_iter(missing.iter().cloned()))
            .await?;
        tracing::debug!(requested = missing.len(), inserted, "created missing tags");

        found = select_by_name(conn, &wanted).await?;
    }

    wanted
        .into_iter()
        .map(|name| match found.get(&name) {
            Some(&id) => Ok(Tag { id, name }),
            None => Err(DatabaseError::DataIntegrity(format!(
                "tag '{name}' missing after insert"
            ))),
        })
        .collect()
}

/// Replace an entry's tag links with `tags`.
///
/// # Errors
///
/// Returns `DatabaseError` if a statement fails.
pub async fn replace_entry_tags(
    conn: &libsql::Connection,
    entry_id: &str,
    tags: &[Tag],
) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM entry_tags WHERE entry_id = ?1", [entry_id])
        .await?;
    if tags.is_empty() {
        return Ok(());
    }

    let values = (2..tags.len() + 2)
        .map(|i| format!("(?1, ?{i})"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES {values}");
    let mut params: Vec<libsql::Value> = vec![entry_id.into()];
    params.extend(tags.iter().map(|t| libsql::Value::Integer(t.id)));
    conn.execute(&sql, libsql::params_from_iter(params)).await?;
    Ok(())
}

impl GlossService {
    /// [`ensure_tags_exist`] in its own transaction.
    ///
    /// # Errors
    ///
    /// Same as [`ensure_tags_exist`].
    pub async fn ensure_tags(&self, names: &[String]) -> Result<Vec<Tag>, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = ensure_tags_exist(&tx, names).await;
        tx.finish(result).await
    }

    /// Create a single tag. Unlike [`ensure_tags_exist`], an existing name is
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a blank name and
    /// `DatabaseError::Conflict` if the name is taken.
    pub async fn create_tag(&self, name: &str) -> Result<Tag, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DatabaseError::Validation("tag name must not be blank".into()));
        }

        let tx = self.db().begin().await?;
        let result = async {
            let taken = || format!("tag '{name}' already exists");
            let mut rows = tx
                .query("INSERT INTO tags (name) VALUES (?1) RETURNING id", [name])
                .await
                .map_err(|e| DatabaseError::from_insert(e, taken))?;
            // With RETURNING the constraint fires on the first step, not on prepare.
            let row = rows
                .next()
                .await
                .map_err(|e| DatabaseError::from_insert(e, taken))?
                .ok_or(DatabaseError::NoResult)?;
            let tag = Tag {
                id: row.get::<i64>(0)?,
                name: name.to_string(),
            };
            drop(rows);
            append_audit(
                &tx,
                EntityType::Tag,
                &tag.id.to_string(),
                AuditAction::Created,
                None,
            )
            .await?;
            Ok::<_, DatabaseError>(tag)
        }
        .await;
        tx.finish(result).await
    }

    /// All tags with the number of entries carrying each, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_tags(&self) -> Result<Vec<TagUsage>, DatabaseError> {
        let conn = self.db().acquire().await?;
        let mut rows = conn
            .query(
                "SELECT t.id, t.name, COUNT(et.entry_id)
                 FROM tags t LEFT JOIN entry_tags et ON et.tag_id = t.id
                 GROUP BY t.id, t.name
                 ORDER BY t.name",
                (),
            )
            .await?;

        let mut tags = Vec::new();
        while let Some(row) = rows.next().await? {
            tags.push(TagUsage {
                tag: Tag {
                    id: row.get::<i64>(0)?,
                    name: row.get::<String>(1)?,
                },
                entry_count: u32::try_from(row.get::<i64>(2)?).unwrap_or(u32::MAX),
            });
        }
        Ok(tags)
    }

    /// Delete tags no entry carries. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the delete fails.
    pub async fn prune_unused_tags(&self) -> Result<u64, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let removed = tx
                .execute(
                    "DELETE FROM tags WHERE id NOT IN (SELECT tag_id FROM entry_tags)",
                    (),
                )
                .await?;
            if removed > 0 {
                tracing::info!(removed, "pruned unused tags");
            }
            Ok::<_, DatabaseError>(removed)
        }
        .await;
        tx.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{file_service, test_service};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn ensure_creates_then_reuses() {
        let svc = test_service().await;

        let first = svc.ensure_tags(&names(&["core", "cardio"])).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].name, "core");
        assert_eq!(first[1].name, "cardio");

        let second = svc.ensure_tags(&names(&["cardio", "mobility"])).await.unwrap();
        assert_eq!(second[0], first[1], "existing tag keeps its id");
        assert_eq!(second[1].name, "mobility");

        assert_eq!(svc.list_tags().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn ensure_normalizes_input() {
        let svc = test_service().await;
        let tags = svc
            .ensure_tags(&names(&["  core ", "", "core", "   ", "Core"]))
            .await
            .unwrap();
        let got: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(got, vec!["core", "Core"], "trimmed, deduped, case kept");
    }

    #[tokio::test]
    async fn ensure_empty_is_noop() {
        let svc = test_service().await;
        assert!(svc.ensure_tags(&[]).await.unwrap().is_empty());
        assert!(svc.list_tags().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_tag_conflicts_on_existing_name() {
        let svc = test_service().await;
        let tag = svc.create_tag("grip").await.unwrap();
        assert!(tag.id > 0);

        let err = svc.create_tag("grip").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)), "got {err:?}");

        let err = svc.create_tag("  ").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
    }

    #[tokio::test]
    async fn create_tag_conflict_leaves_one_row_and_no_extra_audit() {
        let svc = test_service().await;
        svc.ensure_tags(&names(&["grip"])).await.unwrap();

        let err = svc.create_tag(" grip ").await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(ref msg) if msg.contains("grip")), "got {err:?}");

        let tags = svc.list_tags().await.unwrap();
        assert_eq!(tags.len(), 1);
        let conn = svc.db().acquire().await.unwrap();
        let mut rows = conn
            .query("SELECT COUNT(*) FROM audit_trail WHERE entity_type = 'tag'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 0, "failed create rolls back its audit row");
    }

    #[tokio::test]
    async fn prune_removes_only_unused() {
        let svc = test_service().await;
        let tags = svc.ensure_tags(&names(&["used", "unused"])).await.unwrap();

        let conn = svc.db().acquire().await.unwrap();
        conn.execute(
            "INSERT INTO entries (id, title, type) VALUES ('exercise-1-row', 'Row', 'exercise')",
            (),
        )
        .await
        .unwrap();
        replace_entry_tags(&conn, "exercise-1-row", &tags[..1])
            .await
            .unwrap();
        drop(conn);

        assert_eq!(svc.prune_unused_tags().await.unwrap(), 1);
        let left = svc.list_tags().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].tag.name, "used");
        assert_eq!(left[0].entry_count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ensure_resolves_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let svc = Arc::new(file_service(dir.path(), 4).await);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                svc.ensure_tags(&["NewTag".to_string()]).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            let tags = handle.await.unwrap().unwrap();
            assert_eq!(tags.len(), 1);
            ids.push(tags[0].id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "every writer sees the same id");

        let all = svc.list_tags().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tag.name, "NewTag");
    }
}
