//! Entry change-set builder.

use gloss_core::enums::EntryType;
use gloss_core::payload::{EditRequest, EntryChangeSet};

#[derive(Debug, Default)]
pub struct EntryChangeSetBuilder(EntryChangeSet);

impl EntryChangeSetBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.0.description = Some(val.into());
        self
    }

    #[must_use]
    pub fn aliases(mut self, val: Vec<String>) -> Self {
        self.0.aliases = Some(val);
        self
    }

    #[must_use]
    pub fn tags(mut self, val: Vec<String>) -> Self {
        self.0.tags = Some(val);
        self
    }

    /// `None` clears the link.
    #[must_use]
    pub fn video_link(mut self, val: Option<String>) -> Self {
        self.0.video_link = Some(val);
        self
    }

    #[must_use]
    pub fn entry_type(mut self, val: EntryType) -> Self {
        self.0.entry_type = Some(val);
        self
    }

    #[must_use]
    pub fn mentions(mut self, ids: Vec<String>) -> Self {
        self.0.mentioned_entries = Some(ids);
        self
    }

    #[must_use]
    pub fn build(self) -> EntryChangeSet {
        self.0
    }

    /// Wrap the change-set as an edit of `entry_id`.
    #[must_use]
    pub fn for_entry(self, entry_id: impl Into<String>) -> EditRequest {
        EditRequest {
            entry_id: entry_id.into(),
            change_set: self.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_only_set_fields() {
        let set = EntryChangeSetBuilder::new()
            .description("Hold a straight line")
            .video_link(None)
            .build();
        assert_eq!(
            serde_json::to_value(&set).unwrap(),
            json!({"description": "Hold a straight line", "video_link": null})
        );
    }

    #[test]
    fn empty_builder_is_empty() {
        assert!(EntryChangeSetBuilder::new().build().is_empty());
    }

    #[test]
    fn for_entry_wraps_edit() {
        let edit = EntryChangeSetBuilder::new()
            .entry_type(EntryType::Term)
            .for_entry("exercise-1-plank");
        assert_eq!(edit.entry_id, "exercise-1-plank");
        assert_eq!(edit.change_set.entry_type, Some(EntryType::Term));
    }
}
