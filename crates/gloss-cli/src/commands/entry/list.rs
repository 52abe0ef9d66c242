use gloss_core::entities::Entry;
use gloss_core::enums::EntryType;
use gloss_db::repos::entry::EntryFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct EntryListResponse {
    entries: Vec<Entry>,
}

pub async fn run(
    entry_type: Option<&str>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let filter = EntryFilter {
        entry_type: entry_type
            .map(|value| parse_enum::<EntryType>(value, "type"))
            .transpose()?,
        limit: flags.limit,
    };
    let entries = ctx.service.list_entries(&filter).await?;
    output(&EntryListResponse { entries }, flags.format)
}
