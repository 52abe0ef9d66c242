//! Reference graph: mention resolution and the `entry_references` edge table.
//!
//! Each entry keeps its outgoing references twice: as rows in
//! `entry_references` and as the `mentioned_entries` JSON list on the entry
//! row. [`sync_references`] rewrites both from scratch on every save. The edge
//! table is authoritative; [`check_reference_cache`] reports where the cached
//! list disagrees with it and [`GlossService::repair_reference_caches`]
//! rewrites the cache from the edges.
//!
//! Resolution has two modes. With an explicit id list (from the mention-aware
//! editor) ids are validated in one lookup and unknown ids are dropped. With
//! no list, the description is scanned for `@Name` tokens and each token is
//! matched against entry titles ignoring case (Unicode lowercase, through
//! the stored `title_key` column). A token that matches nothing stays plain
//! text.

use std::collections::{HashMap, HashSet};

use gloss_core::audit_detail::DeletedDetail;
use gloss_core::entities::{EntryReference, ReferenceDrift};
use gloss_core::enums::{AuditAction, EntityType};
use gloss_core::mentions::{ResolvedMention, scan_mentions, title_key};
use gloss_core::responses::ReferenceCheckResponse;

use crate::error::DatabaseError;
use crate::helpers::{dedupe_preserving_order, parse_json_list, placeholders, to_json_text};
use crate::repos::audit::{append_audit, detail};
use crate::service::GlossService;

/// Validate explicit target ids, keeping caller order.
///
/// # Errors
///
/// Returns `DatabaseError` if the lookup fails.
pub async fn resolve_explicit(
    conn: &libsql::Connection,
    ids: &[String],
) -> Result<Vec<ResolvedMention>, DatabaseError> {
    let ids = dedupe_preserving_order(ids.iter().cloned());
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id, title FROM entries WHERE id IN ({})",
        placeholders(1, ids.len())
    );
    let mut rows = conn
        .query(&sql, libsql::params_from_iter(ids.iter().cloned()))
        .await?;
    let mut titles = HashMap::new();
    while let Some(row) = rows.next().await? {
        titles.insert(row.get::<String>(0)?, row.get::<String>(1)?);
    }

    let resolved: Vec<ResolvedMention> = ids
        .into_iter()
        .filter_map(|id| {
            let name = titles.get(&id).cloned();
            if name.is_none() {
                tracing::debug!(target_id = %id, "dropping mention of unknown entry");
            }
            name.map(|name| ResolvedMention {
                name,
                target_id: id,
            })
        })
        .collect();
    Ok(resolved)
}

/// Scan `text` for `@Name` tokens and match them against entry titles.
///
/// Tokens and titles are compared by [`title_key`]. When several entries
/// share a key the one first by title, then id, wins.
///
/// # Errors
///
/// Returns `DatabaseError` if the lookup fails.
pub async fn resolve_implicit(
    conn: &libsql::Connection,
    text: &str,
) -> Result<Vec<ResolvedMention>, DatabaseError> {
    let tokens = scan_mentions(text);
    if tokens.is_empty() {
        return Ok(Vec::new());
    }

    let keys = dedupe_preserving_order(tokens.iter().map(|t| title_key(t)));
    let sql = format!(
        "SELECT id, title, title_key FROM entries WHERE title_key IN ({}) ORDER BY title, id",
        placeholders(1, keys.len())
    );
    let mut rows = conn
        .query(&sql, libsql::params_from_iter(keys.iter().cloned()))
        .await?;

    let mut by_key: HashMap<String, ResolvedMention> = HashMap::new();
    while let Some(row) = rows.next().await? {
        let id = row.get::<String>(0)?;
        let title = row.get::<String>(1)?;
        by_key
            .entry(row.get::<String>(2)?)
            .or_insert(ResolvedMention {
                name: title,
                target_id: id,
            });
    }

    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    for token in tokens {
        match by_key.get(&title_key(&token)) {
            Some(hit) => {
                if seen.insert(hit.target_id.clone()) {
                    resolved.push(hit.clone());
                }
            }
            None => tracing::debug!(%token, "unmatched mention left as text"),
        }
    }
    Ok(resolved)
}

/// Explicit mode when `explicit` is a non-empty list, implicit otherwise.
///
/// # Errors
///
/// Returns `DatabaseError` if a lookup fails.
pub async fn resolve_mentions(
    conn: &libsql::Connection,
    description: &str,
    explicit: Option<&[String]>,
) -> Result<Vec<ResolvedMention>, DatabaseError> {
    match explicit {
        Some(ids) if !ids.is_empty() => resolve_explicit(conn, ids).await,
        _ => resolve_implicit(conn, description).await,
    }
}

/// Recompute an entry's outgoing references from its description.
///
/// Overwrites `mentioned_entries`, deletes every outgoing edge, and inserts
/// one edge per resolved target. The entry's own id is never a target.
/// Runs on the caller's transaction; returns the new target list.
///
/// # Errors
///
/// Returns `DatabaseError` if resolution or a write fails.
pub async fn sync_references(
    conn: &libsql::Connection,
    entry_id: &str,
    description: &str,
    explicit: Option<&[String]>,
) -> Result<Vec<String>, DatabaseError> {
    let resolved = resolve_mentions(conn, description, explicit).await?;
    let targets: Vec<String> = resolved
        .into_iter()
        .map(|m| m.target_id)
        .filter(|id| id != entry_id)
        .collect();

    write_cache(conn, entry_id, &targets).await?;
    conn.execute(
        "DELETE FROM entry_references WHERE source_entry_id = ?1",
        [entry_id],
    )
    .await?;
    if !targets.is_empty() {
        let values = (2..targets.len() + 2)
            .map(|i| format!("(?1, ?{i})"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT OR IGNORE INTO entry_references (source_entry_id, target_entry_id) VALUES {values}"
        );
        let mut params: Vec<String> = Vec::with_capacity(targets.len() + 1);
        params.push(entry_id.to_string());
        params.extend(targets.iter().cloned());
        conn.execute(&sql, libsql::params_from_iter(params)).await?;
    }

    tracing::debug!(entry_id, edges = targets.len(), "references synced");
    Ok(targets)
}

async fn write_cache(
    conn: &libsql::Connection,
    entry_id: &str,
    targets: &[String],
) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE entries SET mentioned_entries = ?1 WHERE id = ?2",
        libsql::params![to_json_text(targets)?, entry_id],
    )
    .await?;
    Ok(())
}

async fn read_cache(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<Option<Vec<String>>, DatabaseError> {
    let mut rows = conn
        .query(
            "SELECT mentioned_entries FROM entries WHERE id = ?1",
            [entry_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(parse_json_list(
            row.get::<Option<String>>(0)?.as_deref(),
        )?)),
        None => Ok(None),
    }
}

async fn single_column(
    conn: &libsql::Connection,
    sql: &str,
    entry_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    let mut rows = conn.query(sql, [entry_id]).await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get::<String>(0)?);
    }
    Ok(ids)
}

/// Targets of `entry_id`'s outgoing edges, in insertion order.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails.
pub async fn outgoing_targets(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    single_column(
        conn,
        "SELECT target_entry_id FROM entry_references WHERE source_entry_id = ?1 ORDER BY rowid",
        entry_id,
    )
    .await
}

/// Sources of edges pointing at `entry_id`.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails.
pub async fn incoming_sources(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<Vec<String>, DatabaseError> {
    single_column(
        conn,
        "SELECT source_entry_id FROM entry_references WHERE target_entry_id = ?1 ORDER BY rowid",
        entry_id,
    )
    .await
}

/// Remove every edge touching `entry_id` and prune it from the caches of
/// entries that mentioned it. Runs on the caller's transaction.
pub(crate) async fn detach_entry(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<DeletedDetail, DatabaseError> {
    let sources = incoming_sources(conn, entry_id).await?;

    let outgoing = conn
        .execute(
            "DELETE FROM entry_references WHERE source_entry_id = ?1",
            [entry_id],
        )
        .await?;
    let incoming = conn
        .execute(
            "DELETE FROM entry_references WHERE target_entry_id = ?1",
            [entry_id],
        )
        .await?;

    for source in &sources {
        if let Some(cache) = read_cache(conn, source).await? {
            let pruned: Vec<String> = cache.into_iter().filter(|id| id != entry_id).collect();
            write_cache(conn, source, &pruned).await?;
        }
    }

    Ok(DeletedDetail { outgoing, incoming })
}

/// Compare an entry's cached mention list with its edge rows.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if the entry does not exist.
pub async fn check_reference_cache(
    conn: &libsql::Connection,
    entry_id: &str,
) -> Result<ReferenceDrift, DatabaseError> {
    let cached = read_cache(conn, entry_id)
        .await?
        .ok_or_else(|| DatabaseError::not_found(EntityType::Entry, entry_id))?;
    let edges = outgoing_targets(conn, entry_id).await?;

    let cached_set: HashSet<&String> = cached.iter().collect();
    let edge_set: HashSet<&String> = edges.iter().collect();

    Ok(ReferenceDrift {
        entry_id: entry_id.to_string(),
        cached_only: cached
            .iter()
            .filter(|id| !edge_set.contains(id))
            .cloned()
            .collect(),
        edges_only: edges
            .iter()
            .filter(|id| !cached_set.contains(id))
            .cloned()
            .collect(),
    })
}

async fn all_entry_ids(conn: &libsql::Connection) -> Result<Vec<String>, DatabaseError> {
    let mut rows = conn.query("SELECT id FROM entries ORDER BY id", ()).await?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next().await? {
        ids.push(row.get::<String>(0)?);
    }
    Ok(ids)
}

impl GlossService {
    /// Outgoing edges of `entry_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn references_from(
        &self,
        entry_id: &str,
    ) -> Result<Vec<EntryReference>, DatabaseError> {
        let conn = self.db().acquire().await?;
        Ok(outgoing_targets(&conn, entry_id)
            .await?
            .into_iter()
            .map(|target| EntryReference {
                source_entry_id: entry_id.to_string(),
                target_entry_id: target,
            })
            .collect())
    }

    /// Incoming edges of `entry_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn references_to(&self, entry_id: &str) -> Result<Vec<EntryReference>, DatabaseError> {
        let conn = self.db().acquire().await?;
        Ok(incoming_sources(&conn, entry_id)
            .await?
            .into_iter()
            .map(|source| EntryReference {
                source_entry_id: source,
                target_entry_id: entry_id.to_string(),
            })
            .collect())
    }

    /// Re-run [`sync_references`] for one entry from its stored description.
    ///
    /// Useful after entries were created that earlier `@Name` text can now
    /// resolve to. An explicit mention list is not kept separately from the
    /// cache, so this always rescans.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the entry does not exist.
    pub async fn resync_references(&self, entry_id: &str) -> Result<Vec<String>, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let mut rows = tx
                .query("SELECT definition FROM entries WHERE id = ?1", [entry_id])
                .await?;
            let description = match rows.next().await? {
                Some(row) => row.get::<String>(0)?,
                None => return Err(DatabaseError::not_found(EntityType::Entry, entry_id)),
            };
            drop(rows);
            sync_references(&tx, entry_id, &description, None).await
        }
        .await;
        tx.finish(result).await
    }

    /// Check one entry, or every entry when `entry_id` is `None`.
    ///
    /// Only drifting entries are listed in the response.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown `entry_id`.
    pub async fn check_references(
        &self,
        entry_id: Option<&str>,
    ) -> Result<ReferenceCheckResponse, DatabaseError> {
        let conn = self.db().acquire().await?;
        let ids = match entry_id {
            Some(id) => vec![id.to_string()],
            None => all_entry_ids(&conn).await?,
        };

        let mut response = ReferenceCheckResponse {
            checked: ids.len(),
            ..Default::default()
        };
        for id in &ids {
            let drift = check_reference_cache(&conn, id).await?;
            if !drift.is_consistent() {
                tracing::warn!(entry_id = %id, ?drift, "mention cache drifted from edges");
                response.drift.push(drift);
            }
        }
        Ok(response)
    }

    /// Check like [`check_references`](Self::check_references), then rewrite
    /// each drifting cache from the edge table in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` for an unknown `entry_id`, or the
    /// first write error (nothing is repaired in that case).
    pub async fn repair_reference_caches(
        &self,
        entry_id: Option<&str>,
    ) -> Result<ReferenceCheckResponse, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let ids = match entry_id {
                Some(id) => vec![id.to_string()],
                None => all_entry_ids(&tx).await?,
            };

            let mut response = ReferenceCheckResponse {
                checked: ids.len(),
                ..Default::default()
            };
            for id in &ids {
                let drift = check_reference_cache(&tx, id).await?;
                if drift.is_consistent() {
                    continue;
                }
                let edges = outgoing_targets(&tx, id).await?;
                write_cache(&tx, id, &edges).await?;
                append_audit(
                    &tx,
                    EntityType::Entry,
                    id,
                    AuditAction::CacheRepaired,
                    detail(&drift)?,
                )
                .await?;
                response.repaired.push(id.clone());
                response.drift.push(drift);
            }
            Ok::<_, DatabaseError>(response)
        }
        .await;

        let response = tx.finish(result).await?;
        if !response.repaired.is_empty() {
            tracing::info!(repaired = response.repaired.len(), "mention caches repaired");
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{insert_bare_entry, test_service};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[tokio::test]
    async fn explicit_keeps_order_and_drops_unknown() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-1-amrap", "AMRAP").await;
        insert_bare_entry(&svc, "term-2-emom", "EMOM").await;

        let conn = svc.db().acquire().await.unwrap();
        let resolved = resolve_explicit(
            &conn,
            &ids(&["term-2-emom", "term-9-gone", "term-1-amrap", "term-2-emom"]),
        )
        .await
        .unwrap();
        assert_eq!(
            resolved,
            vec![
                ResolvedMention {
                    name: "EMOM".into(),
                    target_id: "term-2-emom".into()
                },
                ResolvedMention {
                    name: "AMRAP".into(),
                    target_id: "term-1-amrap".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn implicit_matches_titles_ignoring_case() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "exercise-1-burpees", "Burpees").await;
        insert_bare_entry(&svc, "exercise-2-jumping-jacks", "Jumping Jacks").await;

        let conn = svc.db().acquire().await.unwrap();
        let resolved = resolve_implicit(
            &conn,
            "Start with @jumping Jacks, then @BURPEES and @Unknown. Again @Burpees",
        )
        .await
        .unwrap();
        let targets: Vec<&str> = resolved.iter().map(|m| m.target_id.as_str()).collect();
        assert_eq!(targets, vec!["exercise-2-jumping-jacks", "exercise-1-burpees"]);
        assert_eq!(resolved[1].name, "Burpees", "stored title, not the token");
    }

    #[rstest]
    #[case("see @élan", &["term-1-elan"])]
    #[case("see @ÉLAN", &["term-1-elan"])]
    #[case("@ünterschwung und @Élan", &["exercise-2-unterschwung", "term-1-elan"])]
    #[case("@Elan without the accent", &[])]
    #[case("@Élan@ÜNTERSCHWUNG", &["term-1-elan", "exercise-2-unterschwung"])]
    #[tokio::test]
    async fn implicit_folds_non_ascii_case(#[case] description: &str, #[case] expected: &[&str]) {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-1-elan", "Élan").await;
        insert_bare_entry(&svc, "exercise-2-unterschwung", "Ünterschwung").await;
        insert_bare_entry(&svc, "term-3-source", "Source").await;

        let conn = svc.db().acquire().await.unwrap();
        let targets = sync_references(&conn, "term-3-source", description, None)
            .await
            .unwrap();
        assert_eq!(targets, ids(expected));
        assert_eq!(outgoing_targets(&conn, "term-3-source").await.unwrap(), targets);
    }

    #[tokio::test]
    async fn implicit_tie_breaks_by_title_then_id() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-2-plank", "plank").await;
        insert_bare_entry(&svc, "exercise-3-plank", "Plank").await;
        insert_bare_entry(&svc, "exercise-1-plank", "Plank").await;

        let conn = svc.db().acquire().await.unwrap();
        let resolved = resolve_implicit(&conn, "hold @Plank").await.unwrap();
        // "Plank" sorts before "plank" (BINARY); ids break the remaining tie.
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].target_id, "exercise-1-plank");
    }

    #[tokio::test]
    async fn sync_excludes_self_and_replaces_edges() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-1-amrap", "AMRAP").await;
        insert_bare_entry(&svc, "term-2-emom", "EMOM").await;
        insert_bare_entry(&svc, "term-3-tabata", "Tabata").await;

        let conn = svc.db().acquire().await.unwrap();
        let targets = sync_references(&conn, "term-1-amrap", "@AMRAP vs @EMOM vs @Tabata", None)
            .await
            .unwrap();
        assert_eq!(targets, ids(&["term-2-emom", "term-3-tabata"]));
        assert_eq!(outgoing_targets(&conn, "term-1-amrap").await.unwrap(), targets);

        let targets = sync_references(&conn, "term-1-amrap", "only @Tabata", None)
            .await
            .unwrap();
        assert_eq!(targets, ids(&["term-3-tabata"]));
        assert_eq!(outgoing_targets(&conn, "term-1-amrap").await.unwrap(), targets);
        assert_eq!(
            read_cache(&conn, "term-1-amrap").await.unwrap().unwrap(),
            targets
        );
    }

    #[tokio::test]
    async fn explicit_list_overrides_description() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-1-amrap", "AMRAP").await;
        insert_bare_entry(&svc, "term-2-emom", "EMOM").await;
        insert_bare_entry(&svc, "term-3-tabata", "Tabata").await;

        let conn = svc.db().acquire().await.unwrap();
        let explicit = ids(&["term-3-tabata"]);
        let targets = sync_references(&conn, "term-1-amrap", "see @EMOM", Some(&explicit))
            .await
            .unwrap();
        assert_eq!(targets, explicit);

        // An empty explicit list falls back to scanning.
        let targets = sync_references(&conn, "term-1-amrap", "see @EMOM", Some(&[]))
            .await
            .unwrap();
        assert_eq!(targets, ids(&["term-2-emom"]));
    }

    #[tokio::test]
    async fn check_and_repair_drift() {
        let svc = test_service().await;
        insert_bare_entry(&svc, "term-1-amrap", "AMRAP").await;
        insert_bare_entry(&svc, "term-2-emom", "EMOM").await;
        {
            let conn = svc.db().acquire().await.unwrap();
            sync_references(&conn, "term-1-amrap", "@EMOM", None)
                .await
                .unwrap();
            // Corrupt the cache behind the maintainer's back.
            write_cache(&conn, "term-1-amrap", &ids(&["term-9-gone"]))
                .await
                .unwrap();
        }

        let report = svc.check_references(None).await.unwrap();
        assert_eq!(report.checked, 2);
        assert_eq!(report.drift.len(), 1);
        assert_eq!(report.drift[0].cached_only, ids(&["term-9-gone"]));
        assert_eq!(report.drift[0].edges_only, ids(&["term-2-emom"]));
        assert!(report.repaired.is_empty());

        let repaired = svc.repair_reference_caches(None).await.unwrap();
        assert_eq!(repaired.repaired, ids(&["term-1-amrap"]));

        let after = svc.check_references(Some("term-1-amrap")).await.unwrap();
        assert!(after.drift.is_empty());
    }

    #[tokio::test]
    async fn check_unknown_entry_is_not_found() {
        let svc = test_service().await;
        let err = svc.check_references(Some("term-0-none")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
