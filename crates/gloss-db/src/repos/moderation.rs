//! Moderation applier.
//!
//! ```text
//! pending → approved   (entry created or updated)
//!         → rejected   (entries untouched)
//! ```
//!
//! Approval claims the submission with a conditional update
//! (`WHERE status = 'pending'`) and applies its payload on the same
//! transaction. If anything fails, the claim rolls back with the entry
//! changes and the submission stays pending. A second approval, or an
//! approval racing a rejection, finds zero pending rows and fails with
//! `InvalidTransition`.

use chrono::Utc;

use gloss_core::audit_detail::StatusChangedDetail;
use gloss_core::entities::{Entry, Submission};
use gloss_core::enums::{AuditAction, EntityType, SubmissionStatus};
use gloss_core::payload::SubmissionPayload;
use gloss_core::responses::ApprovalResponse;

use crate::error::DatabaseError;
use crate::repos::audit::{append_audit, detail};
use crate::repos::entry::{create_entry_in, get_entry_in, update_entry_in};
use crate::repos::submission::get_submission_in;
use crate::service::GlossService;

fn invalid_transition(id: &str, from: SubmissionStatus, to: SubmissionStatus) -> DatabaseError {
    DatabaseError::InvalidTransition {
        entity: EntityType::Submission,
        id: id.to_string(),
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    }
}

/// Move a pending submission to `to`, or fail if it is no longer pending.
async fn claim(
    conn: &libsql::Connection,
    submission: &Submission,
    to: SubmissionStatus,
    note: Option<&str>,
) -> Result<(), DatabaseError> {
    if !submission.status.can_transition_to(to) {
        return Err(invalid_transition(&submission.id, submission.status, to));
    }

    let changed = conn
        .execute(
            "UPDATE user_submissions SET status = ?1, reviewed_at = ?2, review_note = ?3
             WHERE id = ?4 AND status = 'pending'",
            libsql::params![
                to.as_str(),
                Utc::now().to_rfc3339(),
                note,
                submission.id.as_str()
            ],
        )
        .await?;
    if changed == 0 {
        // Someone else moved it between our read and the update.
        let now = get_submission_in(conn, &submission.id)
            .await?
            .map_or(submission.status, |s| s.status);
        return Err(invalid_transition(&submission.id, now, to));
    }
    Ok(())
}

/// Apply an approved submission's payload through the entry store.
///
/// New submissions create an entry. Edits load the target, merge the
/// change-set over it, and replace it.
///
/// # Errors
///
/// Returns `DatabaseError::NotFound` if an edit's target entry is gone, or
/// any entry store error.
pub async fn apply_approved(
    conn: &libsql::Connection,
    submission: &Submission,
) -> Result<Entry, DatabaseError> {
    match &submission.payload {
        SubmissionPayload::New(draft) => create_entry_in(conn, draft, Some(&submission.id)).await,
        SubmissionPayload::Edit(edit) => {
            let current = get_entry_in(conn, &edit.entry_id)
                .await?
                .ok_or_else(|| DatabaseError::not_found(EntityType::Entry, &edit.entry_id))?;
            let merged = edit.change_set.apply_to(&current);
            update_entry_in(conn, &current.id, &merged, Some(&submission.id)).await
        }
    }
}

async fn load(conn: &libsql::Connection, id: &str) -> Result<Submission, DatabaseError> {
    get_submission_in(conn, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found(EntityType::Submission, id))
}

async fn record(
    conn: &libsql::Connection,
    id: &str,
    action: AuditAction,
    to: SubmissionStatus,
    note: Option<&str>,
) -> Result<(), DatabaseError> {
    append_audit(
        conn,
        EntityType::Submission,
        id,
        action,
        detail(&StatusChangedDetail {
            from: SubmissionStatus::Pending.as_str().to_string(),
            to: to.as_str().to_string(),
            reason: note.map(String::from),
        })?,
    )
    .await?;
    Ok(())
}

impl GlossService {
    /// Approve a pending submission and apply it, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the submission (or an edit's
    /// target entry) does not exist, `DatabaseError::InvalidTransition` if the
    /// submission is not pending, or any entry store error. On error nothing
    /// is written and the submission stays as it was.
    pub async fn approve_submission(
        &self,
        id: &str,
        note: Option<&str>,
    ) -> Result<ApprovalResponse, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let submission = load(&tx, id).await?;
            claim(&tx, &submission, SubmissionStatus::Approved, note).await?;
            let entry = apply_approved(&tx, &submission).await?;
            record(&tx, id, AuditAction::Approved, SubmissionStatus::Approved, note).await?;
            let submission = load(&tx, id).await?;
            Ok::<_, DatabaseError>(ApprovalResponse { submission, entry })
        }
        .await;

        match tx.finish(result).await {
            Ok(response) => {
                tracing::info!(
                    submission_id = %id,
                    entry_id = %response.entry.id,
                    "submission approved"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(submission_id = %id, error = %e, "approval rolled back");
                Err(e)
            }
        }
    }

    /// Reject a pending submission. Entries are never touched.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the submission does not exist or
    /// `DatabaseError::InvalidTransition` if it is not pending.
    pub async fn reject_submission(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<Submission, DatabaseError> {
        let tx = self.db().begin().await?;
        let result = async {
            let submission = load(&tx, id).await?;
            claim(&tx, &submission, SubmissionStatus::Rejected, reason).await?;
            record(&tx, id, AuditAction::Rejected, SubmissionStatus::Rejected, reason).await?;
            load(&tx, id).await
        }
        .await;

        let submission = tx.finish(result).await?;
        tracing::info!(submission_id = %id, "submission rejected");
        Ok(submission)
    }
}
