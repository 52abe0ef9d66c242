use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let Some(mut detail) = ctx.service.get_entry(id).await? else {
        anyhow::bail!("entry '{id}' not found");
    };
    detail.references.sort_by(|a, b| a.name.cmp(&b.name));
    detail.referenced_by.sort_by(|a, b| a.name.cmp(&b.name));
    output(&detail, flags.format)
}
