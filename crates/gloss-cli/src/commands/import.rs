use std::path::Path;

use anyhow::Context;
use gloss_core::entities::Submitter;
use gloss_core::enums::SubmissionKind;
use gloss_core::responses::{ImportFailure, ImportResponse};
use gloss_db::service::GlossService;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ImportArgs;
use crate::context::AppContext;
use crate::output::output;

const FALLBACK_IMPORTER: &str = "import";

/// Handle `gloss import`.
pub async fn handle(args: &ImportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let name = args
        .submitter
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| Some(ctx.config.general.importer_name.clone()))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_IMPORTER.to_string());
    let submitter = Submitter { name, email: None };

    let response = import_file(&ctx.service, &args.file, &submitter, args.approve).await?;
    if !response.failed.is_empty() {
        tracing::warn!(
            file = %args.file.display(),
            failed = response.failed.len(),
            "some import rows were not accepted"
        );
    }
    output(&response, flags.format)
}

/// Submit every row of `path` as a new-entry submission, approving each one
/// when `approve` is set.
///
/// A bad row is recorded in `failed` with its 1-based record number and the
/// import moves on; only an unreadable file fails the whole call.
pub async fn import_file(
    service: &GlossService,
    path: &Path,
    submitter: &Submitter,
    approve: bool,
) -> anyhow::Result<ImportResponse> {
    let rows = serde_jsonlines::json_lines::<serde_json::Value, _>(path)
        .with_context(|| format!("failed to open import file {}", path.display()))?;

    let mut response = ImportResponse::default();
    for (index, row) in rows.enumerate() {
        let line = index + 1;
        let data = match row {
            Ok(data) => data,
            Err(error) => {
                response.failed.push(ImportFailure {
                    line,
                    error: error.to_string(),
                });
                continue;
            }
        };

        let submission = match service
            .submit_raw(SubmissionKind::New.as_str(), data, submitter)
            .await
        {
            Ok(submission) => submission,
            Err(error) => {
                response.failed.push(ImportFailure {
                    line,
                    error: error.to_string(),
                });
                continue;
            }
        };
        response.submitted.push(submission.id.clone());

        if approve {
            match service.approve_submission(&submission.id, None).await {
                Ok(_) => response.approved.push(submission.id),
                Err(error) => response.failed.push(ImportFailure {
                    line,
                    error: error.to_string(),
                }),
            }
        }
    }

    tracing::info!(
        submitted = response.submitted.len(),
        approved = response.approved.len(),
        failed = response.failed.len(),
        "import finished"
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use gloss_core::entities::Submitter;
    use gloss_core::enums::SubmissionStatus;
    use gloss_db::service::GlossService;
    use pretty_assertions::assert_eq;

    use super::import_file;

    fn submitter() -> Submitter {
        Submitter {
            name: "importer".into(),
            email: None,
        }
    }

    fn jsonl(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        for line in lines {
            writeln!(file, "{line}").expect("write line");
        }
        file
    }

    #[tokio::test]
    async fn approved_import_resolves_mentions_between_rows() {
        let service = GlossService::new_local(":memory:").await.unwrap();
        let file = jsonl(&[
            r#"{"name": "Plank", "type": "exercise", "description": "Hold a straight line"}"#,
            r#"{"name": "Burpees", "type": "exercise", "description": "Finish with @Plank.", "tags": ["cardio"]}"#,
        ]);

        let response = import_file(&service, file.path(), &submitter(), true)
            .await
            .unwrap();
        assert_eq!(response.submitted.len(), 2);
        assert_eq!(response.approved, response.submitted);
        assert!(response.failed.is_empty());

        let entries = service.list_entries(&Default::default()).await.unwrap();
        let burpees = entries.iter().find(|e| e.name == "Burpees").unwrap();
        let plank = entries.iter().find(|e| e.name == "Plank").unwrap();
        assert_eq!(burpees.mentioned_entries, vec![plank.id.clone()]);
        assert_eq!(burpees.description, "Finish with @Plank.");
    }

    #[tokio::test]
    async fn bad_rows_are_reported_and_skipped() {
        let service = GlossService::new_local(":memory:").await.unwrap();
        let file = jsonl(&[
            r#"{"name": "Plank", "type": "exercise"}"#,
            r#"{"name": "Broken", "type": "recipe"}"#,
            "not json",
            r#"{"name": "EMOM", "type": "term"}"#,
        ]);

        let response = import_file(&service, file.path(), &submitter(), false)
            .await
            .unwrap();
        assert_eq!(response.submitted.len(), 2);
        assert!(response.approved.is_empty());
        let failed_lines: Vec<usize> = response.failed.iter().map(|f| f.line).collect();
        assert_eq!(failed_lines, vec![2, 3]);

        let pending = service
            .list_submissions(Some(SubmissionStatus::Pending), None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);
        assert!(service.list_entries(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_file_fails_the_import() {
        let service = GlossService::new_local(":memory:").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let result = import_file(&service, &dir.path().join("absent.jsonl"), &submitter(), false).await;
        assert!(result.is_err());
    }
}
