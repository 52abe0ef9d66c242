use gloss_core::entities::EntryReference;
use serde::Serialize;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RefsCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct EdgesResponse {
    entry_id: String,
    outgoing: Vec<EntryReference>,
    incoming: Vec<EntryReference>,
}

/// Handle `gloss refs`.
pub async fn handle(
    action: &RefsCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        RefsCommands::Check { entry, repair } => {
            let response = if *repair {
                ctx.service.repair_reference_caches(entry.as_deref()).await?
            } else {
                ctx.service.check_references(entry.as_deref()).await?
            };
            output(&response, flags.format)
        }
        RefsCommands::Show { id } => {
            let outgoing = ctx.service.references_from(id).await?;
            let incoming = ctx.service.references_to(id).await?;
            output(
                &EdgesResponse {
                    entry_id: id.clone(),
                    outgoing,
                    incoming,
                },
                flags.format,
            )
        }
        RefsCommands::Resync { id } => {
            let mentioned_entries = ctx.service.resync_references(id).await?;
            output(
                &json!({ "entry_id": id, "mentioned_entries": mentioned_entries }),
                flags.format,
            )
        }
    }
}
