//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! provide schema validation for the most common detail shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::Approved` and `AuditAction::Rejected`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for entry `Created`/`Updated`: the reference set written by the save.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReferencesDetail {
    pub mentioned_entries: Vec<String>,
    /// Set when the save came from an approved submission.
    pub submission_id: Option<String>,
}

/// Detail for entry `Deleted`: the edges removed with it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct DeletedDetail {
    pub outgoing: u64,
    pub incoming: u64,
}
