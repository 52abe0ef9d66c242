mod intake;
mod list;
mod review;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SubmissionCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `gloss submission`.
pub async fn handle(
    action: &SubmissionCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SubmissionCommands::New { entry, submitter } => {
            intake::run_new(entry, submitter, ctx, flags).await
        }
        SubmissionCommands::Edit {
            entry_id,
            changes,
            submitter,
        } => intake::run_edit(entry_id, changes, submitter, ctx, flags).await,
        SubmissionCommands::List { status } => list::run(status.as_deref(), ctx, flags).await,
        SubmissionCommands::Get { id } => {
            let submission = ctx.service.get_submission(id).await?;
            output(&submission, flags.format)
        }
        SubmissionCommands::Approve { id, note } => {
            review::approve(id, note.as_deref(), ctx, flags).await
        }
        SubmissionCommands::Reject { id, reason } => {
            review::reject(id, reason.as_deref(), ctx, flags).await
        }
    }
}
