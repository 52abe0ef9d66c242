use clap::{Args, Subcommand};

/// Optional entry fields shared by `entry create` and `submission new`.
#[derive(Clone, Debug, Default, Args)]
pub struct EntryFieldArgs {
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub alias: Vec<String>,
    #[arg(long)]
    pub tag: Vec<String>,
    #[arg(long)]
    pub video_link: Option<String>,
    /// Target entry ID to reference; repeatable. Replaces `@Name` scanning.
    #[arg(long)]
    pub mention: Vec<String>,
}

/// Full field set of a new entry.
#[derive(Clone, Debug, Args)]
pub struct EntryCreateArgs {
    #[arg(long)]
    pub name: String,
    /// exercise or term
    #[arg(long = "type")]
    pub entry_type: String,
    /// Use this ID instead of a generated one.
    #[arg(long)]
    pub id: Option<String>,
    #[command(flatten)]
    pub fields: EntryFieldArgs,
}

/// Partial field set for `entry update` and `submission edit`.
#[derive(Clone, Debug, Default, Args)]
pub struct EntryChangeArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long = "type")]
    pub entry_type: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Replace aliases; repeatable.
    #[arg(long)]
    pub alias: Vec<String>,
    #[arg(long, conflicts_with = "alias")]
    pub clear_aliases: bool,
    /// Replace tags; repeatable.
    #[arg(long)]
    pub tag: Vec<String>,
    #[arg(long, conflicts_with = "tag")]
    pub clear_tags: bool,
    #[arg(long)]
    pub video_link: Option<String>,
    #[arg(long, conflicts_with = "video_link")]
    pub clear_video_link: bool,
    /// Replace referenced entry IDs; repeatable.
    #[arg(long)]
    pub mention: Vec<String>,
}

/// Glossary entry commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EntryCommands {
    /// Create an entry directly, bypassing moderation.
    Create(EntryCreateArgs),
    /// Get an entry with its references.
    Get { id: String },
    /// Update fields of an entry.
    Update {
        id: String,
        #[command(flatten)]
        changes: EntryChangeArgs,
    },
    /// Delete an entry and every reference to it.
    Delete { id: String },
    /// List entries by title.
    List {
        #[arg(long = "type")]
        entry_type: Option<String>,
    },
}
