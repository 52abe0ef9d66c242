use clap::Subcommand;

/// Tag registry commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TagCommands {
    /// Resolve names to tags, creating missing ones.
    Ensure {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Create a single tag. Fails if the name is taken.
    Create { name: String },
    /// List tags with usage counts.
    List,
    /// Delete tags no entry uses.
    Prune,
}
