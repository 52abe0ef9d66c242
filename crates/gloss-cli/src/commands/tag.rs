use gloss_core::entities::{Tag, TagUsage};
use serde::Serialize;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TagCommands;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct TagListResponse<T> {
    tags: Vec<T>,
}

/// Handle `gloss tag`.
pub async fn handle(
    action: &TagCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        TagCommands::Ensure { names } => {
            let tags: Vec<Tag> = ctx.service.ensure_tags(names).await?;
            output(&TagListResponse { tags }, flags.format)
        }
        TagCommands::Create { name } => {
            let tag = ctx.service.create_tag(name).await?;
            output(&tag, flags.format)
        }
        TagCommands::List => {
            let mut tags: Vec<TagUsage> = ctx.service.list_tags().await?;
            if let Some(limit) = flags.limit {
                tags.truncate(usize::try_from(limit)?);
            }
            output(&TagListResponse { tags }, flags.format)
        }
        TagCommands::Prune => {
            let pruned = ctx.service.prune_unused_tags().await?;
            output(&json!({ "pruned": pruned }), flags.format)
        }
    }
}
