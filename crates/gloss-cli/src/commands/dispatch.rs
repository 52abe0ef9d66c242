use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Entry { action } => commands::entry::handle(&action, ctx, flags).await,
        Commands::Tag { action } => commands::tag::handle(&action, ctx, flags).await,
        Commands::Submission { action } => {
            commands::submission::handle(&action, ctx, flags).await
        }
        Commands::Import(args) => commands::import::handle(&args, ctx, flags).await,
        Commands::Refs { action } => commands::refs::handle(&action, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
    }
}
