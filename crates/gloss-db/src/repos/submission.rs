//! Submission intake: the public proposal queue.
//!
//! Payloads are decoded before they are stored, so every row in
//! `user_submissions` has a well-formed `data` column for its kind. Nothing is
//! checked against live entries here.

use chrono::Utc;
use serde_json::json;

use gloss_core::entities::{Submission, Submitter};
use gloss_core::enums::{AuditAction, EntityType, SubmissionStatus};
use gloss_core::ids::PREFIX_SUBMISSION;
use gloss_core::payload::SubmissionPayload;

use crate::error::DatabaseError;
use crate::generate_id;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum, parse_optional_datetime};
use crate::repos::audit::append_audit;
use crate::service::GlossService;

const SUBMISSION_SELECT: &str = "SELECT id, submission_type, data, submitter_name, submitter_email, status, timestamp, reviewed_at, review_note
     FROM user_submissions";

fn row_to_submission(row: &libsql::Row) -> Result<Submission, DatabaseError> {
    let id = row.get::<String>(0)?;
    let kind = parse_enum(&row.get::<String>(1)?)?;
    let data: serde_json::Value = serde_json::from_str(&row.get::<String>(2)?)
        .map_err(|e| DatabaseError::DataIntegrity(format!("submission {id}: data is not JSON: {e}")))?;
    let payload = SubmissionPayload::decode(kind, data)
        .map_err(|e| DatabaseError::DataIntegrity(format!("submission {id}: {e}")))?;

    Ok(Submission {
        payload,
        submitter: Submitter {
            name: row.get::<String>(3)?,
            email: get_opt_string(row, 4)?,
        },
        status: parse_enum(&row.get::<String>(5)?)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        reviewed_at: parse_optional_datetime(get_opt_string(row, 7)?.as_deref())?,
        review_note: get_opt_string(row, 8)?,
        id,
    })
}

/// Load a submission on `conn`. `None` when it does not exist.
///
/// # Errors
///
/// Returns `DatabaseError` if the query fails or the stored row is malformed.
pub async fn get_submission_in(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Option<Submission>, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SUBMISSION_SELECT} WHERE id = ?1"), [id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_submission(&row)?)),
        None => Ok(None),
    }
}

impl GlossService {
    /// Store a decoded payload as a pending submission.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails.
    pub async fn create_submission(
        &self,
        payload: &SubmissionPayload,
        submitter: &Submitter,
    ) -> Result<Submission, DatabaseError> {
        let now = Utc::now();
        let data = payload.data()?;

        let tx = self.db().begin().await?;
        let result = async {
            let id = generate_id(&tx, PREFIX_SUBMISSION).await?;
            tx.execute(
                "INSERT INTO user_submissions (id, submission_type, data, submitter_name, submitter_email, status, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                libsql::params![
                    id.as_str(),
                    payload.kind().as_str(),
                    data.to_string(),
                    submitter.name.as_str(),
                    submitter.email.as_deref(),
                    SubmissionStatus::Pending.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;

            append_audit(
                &tx,
                EntityType::Submission,
                &id,
                AuditAction::Submitted,
                Some(json!({ "kind": payload.kind() })),
            )
            .await?;
            Ok::<_, DatabaseError>(id)
        }
        .await;
        let id = tx.finish(result).await?;

        tracing::info!(submission_id = %id, kind = %payload.kind(), "submission received");
        Ok(Submission {
            id,
            payload: payload.clone(),
            submitter: submitter.clone(),
            status: SubmissionStatus::Pending,
            created_at: now,
            reviewed_at: None,
            review_note: None,
        })
    }

    /// Decode untrusted input and store it as a pending submission.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for an unknown kind or a payload
    /// of the wrong shape; nothing is stored in that case.
    pub async fn submit_raw(
        &self,
        kind: &str,
        data: serde_json::Value,
        submitter: &Submitter,
    ) -> Result<Submission, DatabaseError> {
        let payload = SubmissionPayload::decode_raw(kind, data)?;
        self.create_submission(&payload, submitter).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the submission does not exist.
    pub async fn get_submission(&self, id: &str) -> Result<Submission, DatabaseError> {
        let conn = self.db().acquire().await?;
        get_submission_in(&conn, id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(EntityType::Submission, id))
    }

    /// Submissions oldest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Submission>, DatabaseError> {
        let limit = self.limit_or_default(limit);
        let conn = self.db().acquire().await?;
        let mut rows = match status {
            Some(s) => {
                conn.query(
                    &format!("{SUBMISSION_SELECT} WHERE status = ?1 ORDER BY timestamp, rowid LIMIT ?2"),
                    libsql::params![s.as_str(), limit],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!("{SUBMISSION_SELECT} ORDER BY timestamp, rowid LIMIT ?1"),
                    [limit],
                )
                .await?
            }
        };

        let mut submissions = Vec::new();
        while let Some(row) = rows.next().await? {
            submissions.push(row_to_submission(&row)?);
        }
        Ok(submissions)
    }
}
