use gloss_core::enums::EntryType;
use gloss_core::payload::{EntryChangeSet, EntryDraft};
use gloss_db::updates::entry::EntryChangeSetBuilder;

use crate::cli::subcommands::{EntryChangeArgs, EntryCreateArgs};
use crate::commands::shared::parse::parse_enum;

/// Build a full draft from `--name/--type/...` flags.
pub fn draft_from_args(args: &EntryCreateArgs) -> anyhow::Result<EntryDraft> {
    let entry_type = parse_enum::<EntryType>(&args.entry_type, "type")?;
    let fields = &args.fields;

    let mut draft = EntryDraft::new(&args.name, entry_type)
        .aliases(fields.alias.iter().cloned())
        .tags(fields.tag.iter().cloned());
    draft.id.clone_from(&args.id);
    if let Some(description) = &fields.description {
        draft = draft.description(description);
    }
    if let Some(link) = &fields.video_link {
        draft = draft.video_link(link);
    }
    if !fields.mention.is_empty() {
        draft = draft.mentions(fields.mention.clone());
    }
    Ok(draft)
}

/// Build a change-set from update flags. Fails when no field is given.
pub fn change_set_from_args(args: &EntryChangeArgs) -> anyhow::Result<EntryChangeSet> {
    let mut builder = EntryChangeSetBuilder::new();
    if let Some(name) = &args.name {
        builder = builder.name(name);
    }
    if let Some(entry_type) = &args.entry_type {
        builder = builder.entry_type(parse_enum::<EntryType>(entry_type, "type")?);
    }
    if let Some(description) = &args.description {
        builder = builder.description(description);
    }
    if args.clear_aliases || !args.alias.is_empty() {
        builder = builder.aliases(args.alias.clone());
    }
    if args.clear_tags || !args.tag.is_empty() {
        builder = builder.tags(args.tag.clone());
    }
    if args.clear_video_link {
        builder = builder.video_link(None);
    } else if let Some(link) = &args.video_link {
        builder = builder.video_link(Some(link.clone()));
    }
    if !args.mention.is_empty() {
        builder = builder.mentions(args.mention.clone());
    }

    let changes = builder.build();
    if changes.is_empty() {
        anyhow::bail!("at least one field to change must be provided");
    }
    Ok(changes)
}
