use crate::cli::GlobalFlags;
use crate::cli::subcommands::EntryCreateArgs;
use crate::commands::shared::fields::draft_from_args;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    args: &EntryCreateArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let draft = draft_from_args(args)?;
    let entry = ctx.service.create_entry(&draft).await?;
    output(&entry, flags.format)
}
