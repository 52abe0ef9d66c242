mod create;
mod delete;
mod get;
mod list;
mod update;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::EntryCommands;
use crate::context::AppContext;

/// Handle `gloss entry`.
pub async fn handle(
    action: &EntryCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EntryCommands::Create(args) => create::run(args, ctx, flags).await,
        EntryCommands::Get { id } => get::run(id, ctx, flags).await,
        EntryCommands::Update { id, changes } => update::run(id, changes, ctx, flags).await,
        EntryCommands::Delete { id } => delete::run(id, ctx, flags).await,
        EntryCommands::List { entry_type } => list::run(entry_type.as_deref(), ctx, flags).await,
    }
}
