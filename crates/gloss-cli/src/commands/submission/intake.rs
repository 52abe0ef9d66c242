use gloss_core::entities::Submitter;
use gloss_core::payload::{EditRequest, SubmissionPayload};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{EntryChangeArgs, EntryCreateArgs, SubmitterArgs};
use crate::commands::shared::fields::{change_set_from_args, draft_from_args};
use crate::context::AppContext;
use crate::output::output;

fn submitter(args: &SubmitterArgs) -> anyhow::Result<Submitter> {
    let name = args.submitter.trim();
    if name.is_empty() {
        anyhow::bail!("--submitter must not be blank");
    }
    Ok(Submitter {
        name: name.to_string(),
        email: args.email.clone(),
    })
}

pub async fn run_new(
    entry: &EntryCreateArgs,
    submitter_args: &SubmitterArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let payload = SubmissionPayload::New(draft_from_args(entry)?);
    let submission = ctx
        .service
        .create_submission(&payload, &submitter(submitter_args)?)
        .await?;
    output(&submission, flags.format)
}

pub async fn run_edit(
    entry_id: &str,
    changes: &EntryChangeArgs,
    submitter_args: &SubmitterArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let payload = SubmissionPayload::Edit(EditRequest {
        entry_id: entry_id.to_string(),
        change_set: change_set_from_args(changes)?,
    });
    let submission = ctx
        .service
        .create_submission(&payload, &submitter(submitter_args)?)
        .await?;
    output(&submission, flags.format)
}
