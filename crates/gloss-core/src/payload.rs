//! Submission payloads: what the public may propose.
//!
//! Intake receives untrusted JSON keyed by a submission kind. It is decoded
//! here, once, into [`SubmissionPayload`]; anything with the wrong shape or an
//! unknown field fails with `CoreError::Validation` before it is stored.
//! Content is not checked against live entries at this point. An edit whose
//! target was deleted in the meantime is caught at moderation time.
//!
//! Field names are `snake_case`; the camelCase spellings used by the web
//! client (`videoLink`, `mentionedEntries`, `entryId`, `changeSet`) are
//! accepted as aliases.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::Entry;
use crate::enums::{EntryType, SubmissionKind};
use crate::errors::CoreError;

/// Distinguish an absent key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Every field of an entry, used to create one or to replace one wholesale.
///
/// `mentioned_entries`, when present and non-empty, is the explicit list of
/// referenced entry IDs picked in the mention-aware editor. When absent or
/// empty, references are scanned from `description`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntryDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, alias = "videoLink", skip_serializing_if = "Option::is_none")]
    pub video_link: Option<String>,
    #[serde(
        default,
        alias = "mentionedEntries",
        skip_serializing_if = "Option::is_none"
    )]
    pub mentioned_entries: Option<Vec<String>>,
}

impl EntryDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            entry_type,
            aliases: Vec::new(),
            tags: Vec::new(),
            video_link: None,
            mentioned_entries: None,
        }
    }

    #[must_use]
    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.description = val.into();
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn video_link(mut self, val: impl Into<String>) -> Self {
        self.video_link = Some(val.into());
        self
    }

    #[must_use]
    pub fn mentions(mut self, ids: Vec<String>) -> Self {
        self.mentioned_entries = Some(ids);
        self
    }

    /// Explicit mention IDs, if the draft carries a non-empty list.
    #[must_use]
    pub fn explicit_mentions(&self) -> Option<&[String]> {
        self.mentioned_entries
            .as_deref()
            .filter(|ids| !ids.is_empty())
    }
}

/// The partial field set carried by an edit submission.
///
/// Only keys present in the payload are applied; everything else keeps the
/// entry's current value. `video_link: null` clears the link, while a missing
/// `video_link` leaves it alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EntryChangeSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aliases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(
        default,
        alias = "videoLink",
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<String>")]
    pub video_link: Option<Option<String>>,
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub entry_type: Option<EntryType>,
    #[serde(
        default,
        alias = "mentionedEntries",
        skip_serializing_if = "Option::is_none"
    )]
    pub mentioned_entries: Option<Vec<String>>,
}

impl EntryChangeSet {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.aliases.is_none()
            && self.tags.is_none()
            && self.video_link.is_none()
            && self.entry_type.is_none()
            && self.mentioned_entries.is_none()
    }

    /// Shallow-merge this change-set over `current`.
    ///
    /// If neither `description` nor `mentioned_entries` is part of the
    /// change-set, the entry's current mention cache is carried over as the
    /// explicit reference list so references picked in the editor survive
    /// unrelated edits. A changed description without explicit mentions is
    /// rescanned.
    #[must_use]
    pub fn apply_to(&self, current: &Entry) -> EntryDraft {
        let mentioned_entries = match (&self.mentioned_entries, &self.description) {
            (Some(ids), _) => Some(ids.clone()),
            (None, None) => Some(current.mentioned_entries.clone()),
            (None, Some(_)) => None,
        };

        EntryDraft {
            id: Some(current.id.clone()),
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            description: self
                .description
                .clone()
                .unwrap_or_else(|| current.description.clone()),
            entry_type: self.entry_type.unwrap_or(current.entry_type),
            aliases: self
                .aliases
                .clone()
                .unwrap_or_else(|| current.aliases.clone()),
            tags: self.tags.clone().unwrap_or_else(|| current.tag_names()),
            video_link: self
                .video_link
                .clone()
                .unwrap_or_else(|| current.video_link.clone()),
            mentioned_entries,
        }
    }
}

/// Payload of an edit submission: which entry, and what to change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EditRequest {
    #[serde(alias = "entryId")]
    pub entry_id: String,
    #[serde(alias = "changeSet", alias = "changes")]
    pub change_set: EntryChangeSet,
}

/// A decoded submission payload.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SubmissionPayload {
    New(EntryDraft),
    Edit(EditRequest),
}

impl SubmissionPayload {
    #[must_use]
    pub const fn kind(&self) -> SubmissionKind {
        match self {
            Self::New(_) => SubmissionKind::New,
            Self::Edit(_) => SubmissionKind::Edit,
        }
    }

    /// Decode untyped `data` for a known kind.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if `data` does not have the shape the
    /// kind requires.
    pub fn decode(kind: SubmissionKind, data: serde_json::Value) -> Result<Self, CoreError> {
        let payload = match kind {
            SubmissionKind::New => serde_json::from_value(data).map(Self::New),
            SubmissionKind::Edit => serde_json::from_value(data).map(Self::Edit),
        };
        payload.map_err(|e| CoreError::Validation(format!("malformed {kind} submission: {e}")))
    }

    /// Decode a kind string and untyped `data`, as received from the outside.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for an unknown kind or a malformed payload.
    pub fn decode_raw(kind: &str, data: serde_json::Value) -> Result<Self, CoreError> {
        let kind: SubmissionKind =
            serde_json::from_value(serde_json::Value::String(kind.to_string()))
                .map_err(|_| CoreError::Validation(format!("unknown submission kind '{kind}'")))?;
        Self::decode(kind, data)
    }

    /// The inner `data` object, as persisted in `user_submissions.data`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Other` if serialization fails.
    pub fn data(&self) -> Result<serde_json::Value, CoreError> {
        let value = match self {
            Self::New(draft) => serde_json::to_value(draft),
            Self::Edit(edit) => serde_json::to_value(edit),
        };
        value.map_err(|e| CoreError::Other(e.into()))
    }
}
