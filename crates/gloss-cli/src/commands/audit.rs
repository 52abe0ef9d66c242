use gloss_core::entities::AuditEntry;
use gloss_core::enums::{AuditAction, EntityType};
use gloss_db::repos::audit::AuditFilter;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct AuditResponse {
    entries: Vec<AuditEntry>,
}

/// Handle `gloss audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = AuditFilter {
        entity_type: args
            .entity_type
            .as_deref()
            .map(|value| parse_enum::<EntityType>(value, "entity type"))
            .transpose()?,
        entity_id: args.entity_id.clone(),
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        limit: flags.limit,
    };
    let entries = ctx.service.query_audit(&filter).await?;
    output(&AuditResponse { entries }, flags.format)
}
