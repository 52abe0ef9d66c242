use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::Tag;
use crate::enums::EntryType;
use crate::payload::EntryDraft;

/// A glossary entry: an exercise or a terminology definition.
///
/// `mentioned_entries` is a denormalized copy of the outgoing reference edges,
/// rewritten on every save.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Entry {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub aliases: Vec<String>,
    pub tags: Vec<Tag>,
    pub video_link: Option<String>,
    pub mentioned_entries: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Entry {
    #[must_use]
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }

    /// Full field set of this entry, with its current mention cache as the
    /// explicit reference list.
    #[must_use]
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            id: Some(self.id.clone()),
            name: self.name.clone(),
            description: self.description.clone(),
            entry_type: self.entry_type,
            aliases: self.aliases.clone(),
            tags: self.tag_names(),
            video_link: self.video_link.clone(),
            mentioned_entries: Some(self.mentioned_entries.clone()),
        }
    }
}

/// Directed edge: the source entry's description mentions the target entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct EntryReference {
    pub source_entry_id: String,
    pub target_entry_id: String,
}

/// The far end of a reference edge, as shown next to an entry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReferenceProjection {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

/// An entry with its outgoing and incoming references.
///
/// Neither list is ordered by the store; sort by `name` for display.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntryDetail {
    #[serde(flatten)]
    pub entry: Entry,
    pub references: Vec<ReferenceProjection>,
    pub referenced_by: Vec<ReferenceProjection>,
}

/// Disagreement between an entry's cached mention list and its edge rows.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReferenceDrift {
    pub entry_id: String,
    /// IDs in `mentioned_entries` with no matching edge row.
    pub cached_only: Vec<String>,
    /// Edge targets missing from `mentioned_entries`.
    pub edges_only: Vec<String>,
}

impl ReferenceDrift {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.cached_only.is_empty() && self.edges_only.is_empty()
    }
}
