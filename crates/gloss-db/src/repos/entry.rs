//! Entry store: create, read, replace, delete, list.
//!
//! The `_in` functions take a connection so the moderation applier can run
//! them on its own transaction. The `GlossService` methods wrap each in a
//! transaction of its own.

use chrono::Utc;

use gloss_core::audit_detail::ReferencesDetail;
use gloss_core::entities::{Entry, EntryDetail, ReferenceProjection, Tag};
use gloss_core::enums::{AuditAction, EntityType, EntryType};
use gloss_core::ids::entry_id;
use gloss_core::mentions::title_key;
use gloss_core::payload::EntryDraft;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_json_list, placeholders, to_json_text};
use crate::repos::audit::{append_audit, detail};
use crate::repos::reference::{detach_entry, sync_references};
use crate::repos::tag::{ensure_tags_exist, replace_entry_tags};
use crate::service::GlossService;

const ENTRY_SELECT: &str = "SELECT id, title, definition, type, aliases, video_link, mentioned_entries, updated_at FROM entries";

/// Filter for [`GlossService::list_entries`].
#[derive(Debug, Default)]
pub struct EntryFilter {
    pub entry_type: Option<EntryType>,
    pub limit: Option<u32>,
}

fn row_to_entry(row: &libsql::Row) -> Result<Entry, DatabaseError> {
    Ok(Entry {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        description: row.get::<String>(2)?,
        entry_type: parse_enum(&row.get::<String>(3)?)?,
        aliases: parse_json_list(get_opt_string(row, 4)?.as_deref())?,
        tags: Vec::new(),
        video_link: get_opt_string(row, 5)?,
        mentioned_entries: parse_json_list(get_opt_string(row, 6)?.as_deref())?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

/// Fill in `tags` for each entry with one query.
async fn attach_tags(conn: &libsql::Connection, entries: &mut [Entry]) -> Result<(), DatabaseError> {
    if entries.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT et.entry_id, t.id, t.name
         FROM entry_tags et JOIN tags t ON t.id = et.tag_id
         WHERE et.entry_id IN ({})
         ORDER BY t.name",
        placeholders(1, entries.len())
    );
    let mut rows = conn
        .query(
            &sql,
            libsql::params_from_iter(entries.iter().map(|e| e.id.clone())),
        )
        .await?;
    while let Some(row) = rows.next().await? {
        let owner = row.get::<String>(0)?;
        let tag = Tag {
            id: row.get::<i64>(1)?,
            name: row.get::<String>(2)?,
        };
        if let Some(entry) = entries.iter_mut().find(|e| e.id == owner) {
            entry.tags.push(tag);
        }
    }
    Ok(())
}

async fn projections(
    conn: &libsql::Connection,
    sql: &str,
    entry_id: &str,
) -> Result<Vec<ReferenceProjection>, DatabaseError> {
    let mut rows = conn.query(sql, [entry_id]).await?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().await? {
        out.push(ReferenceProjection {
            id: row.get::<String>(0)?,
            name: row.get::<String>(1)?,
            description: row.get::<String>(2)?,
            entry_type: parse_enum(&row.get::<String>(3)?)?,
        });
    }
    Ok(out)
}

/// Load one entry with its tags. `None` when it does not exist.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails or a row is malformed.
pub async fn get_entry_in(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Entry>, DatabaseError> {
    let mut rows = conn
        .query(&format!("{ENTRY_SELECT} WHERE id = ?1"), [id])
        .await?;
    let Some(row) = rows.next().await? else {
        return Ok(None);
    };
    let mut entry = [row_to_entry(&row)?];
    drop(rows);
    attach_tags(conn, &mut entry).await?;
    let [entry] = entry;
    Ok(Some(entry))
}

fn validate_draft(draft: &EntryDraft) -> Result<(), DatabaseError> {
    if draft.name.trim().is_empty() {
        return Err(DatabaseError::Validation("entry name must not be blank".into()));
    }
    Ok(())
}

/// Resolve and link tags for an exercise. Terms never carry tags.
async fn write_tags(
    conn: &libsql::Connection,
    entry_id: &str,
    draft: &EntryDraft,
) -> Result<(), DatabaseError> {
    let tags = if draft.entry_type.supports_tags() {
        ensure_tags_exist(conn, &draft.tags).await?
    } else {
        if !draft.tags.is_empty() {
            tracing::debug!(entry_id, count = draft.tags.len(), "ignoring tags on a term entry");
        }
        Vec::new()
    };
    replace_entry_tags(conn, entry_id, &tags).await
}

/// Insert a new entry, its tags, and its references on `conn`.
///
/// `origin` is the submission that produced the entry, if any; it is only
/// recorded in the audit trail.
///
/// # Errors
///
/// Returns `DatabaseError::Conflict` if the id is taken,
/// `DatabaseError::Validation` for a blank name, or any write error.
pub async fn create_entry_in(
    conn: &libsql::Connection,
    draft: &EntryDraft,
    origin: Option<&str>,
) -> Result<Entry, DatabaseError> {
    validate_draft(draft)?;
    let now = Utc::now();
    let id = draft
        .id
        .clone()
        .unwrap_or_else(|| entry_id(draft.entry_type, now.timestamp_millis(), &draft.name));

    conn.execute(
        "INSERT INTO entries (id, title, title_key, definition, type, aliases, video_link, mentioned_entries, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, '[]', ?8)",
        libsql::params![
            id.as_str(),
            draft.name.as_str(),
            title_key(&draft.name),
            draft.description.as_str(),
            draft.entry_type.as_str(),
            to_json_text(&draft.aliases)?,
            draft.video_link.as_deref(),
            now.to_rfc3339()
        ],
    )
    .await
    .map_err(|e| DatabaseError::from_insert(e, || format!("entry '{id}' already exists")))?;

    write_tags(conn, &id, draft).await?;
    let mentioned = sync_references(conn, &id, &draft.description, draft.explicit_mentions()).await?;

    append_audit(
        conn,
        EntityType::Entry,
        &id,
        AuditAction::Created,
        detail(&ReferencesDetail {
            mentioned_entries: mentioned,
            submission_id: origin.map(String::from),
        })?,
    )
    .await?;

    get_entry_in(conn, &id)
        .await?
        .ok_or_else(|| DatabaseError::DataIntegrity(format!("entry '{id}' missing after insert")))
}

/// Replace every field of entry `id` with `draft` on `conn`.
///
/// Tags are replaced wholesale and references recomputed.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if the entry does not exist,
/// `DatabaseError::Validation` for a blank name or a draft carrying a
/// different id, or any write error.
pub async fn update_entry_in(
    conn: &libsql::Connection,
    id: &str,
    draft: &EntryDraft,
    origin: Option<&str>,
) -> Result<Entry, DatabaseError> {
    validate_draft(draft)?;
    if let Some(draft_id) = draft.id.as_deref() {
        if draft_id != id {
            return Err(DatabaseError::Validation(format!(
                "draft id '{draft_id}' does not match entry '{id}'"
            )));
        }
    }

    let changed = conn
        .execute(
            "UPDATE entries SET title = ?1, title_key = ?2, definition = ?3, type = ?4, aliases = ?5,
                    video_link = ?6, updated_at = ?7
             WHERE id = ?8",
            libsql::params![
                draft.name.as_str(),
                title_key(&draft.name),
                draft.description.as_str(),
                draft.entry_type.as_str(),
                to_json_text(&draft.aliases)?,
                draft.video_link.as_deref(),
                Utc::now().to_rfc3339(),
                id
            ],
        )
        .await?;
    if changed == 0 {
        return Err(DatabaseError::not_found(EntityType::Entry, id));
    }

    write_tags(conn, id, draft).await?;
    let mentioned = sync_references(conn, id, &draft.description, draft.explicit_mentions()).await?;

    append_audit(
        conn,
        EntityType::Entry,
        id,
        AuditAction::Updated,
        detail(&ReferencesDetail {
            mentioned_entries: mentioned,
            submission_id: origin.map(String::from),
        })?,
    )
    .await?;

    get_entry_in(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::DataIntegrity(format!("entry '{id}' missing after update")))
}

/// Delete entry `id`, its tag links, and every edge touching it, on `conn`.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if the entry does not exist.
pub async fn delete_entry_in(conn: &libsql::Connection, id: &str) -> Result<(), DatabaseError> {
    let mut rows = conn.query("SELECT 1 FROM entries WHERE id = ?1", [id]).await?;
    if rows.next().await?.is_none() {
        return Err(DatabaseError::not_found(EntityType::Entry, id));
    }
    drop(rows);

    conn.execute("DELETE FROM entry_tags WHERE entry_id = ?1", [id])
        .await?;
    let edges = detach_entry(conn, id).await?;
    conn.execute("DELETE FROM entries WHERE id = ?1", [id]).await?;

    append_audit(conn, EntityType::Entry, id, AuditAction::Deleted, detail(&edges)?).await?;
    Ok(())
}

impl GlossService {
    /// Create an entry from `draft`.
    ///
    /// # Errors
    ///
    /// See [`create_entry_in`].
    pub async fn create_entry(&self, draft: &EntryDraft) -> Result<Entry, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = create_entry_in(&tx, draft, None).await;
        let entry = tx.finish(result).await?;
        tracing::info!(entry_id = %entry.id, "entry created");
        Ok(entry)
    }

    /// Entry `id` with its outgoing and incoming references, or `None`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails; a missing entry is not an error.
    pub async fn get_entry(&self, id: &str) -> Result<Option<EntryDetail>, DatabaseError> {
        let conn = self.db().acquire().await?;
        let Some(entry) = get_entry_in(&conn, id).await? else {
            return Ok(None);
        };

        let references = projections(
            &conn,
            "SELECT e.id, e.title, e.definition, e.type
             FROM entry_references r JOIN entries e ON e.id = r.target_entry_id
             WHERE r.source_entry_id = ?1",
            id,
        )
        .await?;
        let referenced_by = projections(
            &conn,
            "SELECT e.id, e.title, e.definition, e.type
             FROM entry_references r JOIN entries e ON e.id = r.source_entry_id
             WHERE r.target_entry_id = ?1",
            id,
        )
        .await?;

        Ok(Some(EntryDetail {
            entry,
            references,
            referenced_by,
        }))
    }

    /// Replace entry `id` with `draft`.
    ///
    /// # Errors
    ///
    /// See [`update_entry_in`].
    pub async fn update_entry(&self, id: &str, draft: &EntryDraft) -> Result<Entry, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = update_entry_in(&tx, id, draft, None).await;
        let entry = tx.finish(result).await?;
        tracing::info!(entry_id = %entry.id, "entry updated");
        Ok(entry)
    }

    /// Delete entry `id`.
    ///
    /// # Errors
    ///
    /// See [`delete_entry_in`].
    pub async fn delete_entry(&self, id: &str) -> Result<(), DatabaseError> {
        let tx = self.db().begin().await?;
        let result = delete_entry_in(&tx, id).await;
        tx.finish(result).await?;
        tracing::info!(entry_id = %id, "entry deleted");
        Ok(())
    }

    /// Entries ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>, DatabaseError> {
        let limit = self.limit_or_default(filter.limit);
        let conn = self.db().acquire().await?;
        let mut rows = match filter.entry_type {
            Some(t) => {
                conn.query(
                    &format!("{ENTRY_SELECT} WHERE type = ?1 ORDER BY title, id LIMIT ?2"),
                    libsql::params![t.as_str(), limit],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!("{ENTRY_SELECT} ORDER BY title, id LIMIT ?1"),
                    [limit],
                )
                .await?
            }
        };

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        drop(rows);
        attach_tags(&conn, &mut entries).await?;
        Ok(entries)
    }
}
