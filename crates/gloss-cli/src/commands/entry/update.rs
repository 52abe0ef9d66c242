use crate::cli::GlobalFlags;
use crate::cli::subcommands::EntryChangeArgs;
use crate::commands::shared::fields::change_set_from_args;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(
    id: &str,
    changes: &EntryChangeArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let changes = change_set_from_args(changes)?;

    let Some(current) = ctx.service.get_entry(id).await? else {
        anyhow::bail!("entry '{id}' not found");
    };
    let draft = changes.apply_to(&current.entry);

    let entry = ctx.service.update_entry(id, &draft).await?;
    output(&entry, flags.format)
}
