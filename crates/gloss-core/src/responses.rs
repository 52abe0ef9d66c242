//! CLI response types returned as JSON by `gloss` commands.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Entry, ReferenceDrift, Submission};

/// Response from `gloss submission approve`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ApprovalResponse {
    pub submission: Submission,
    pub entry: Entry,
}

/// One row of a bulk import that did not make it through.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportFailure {
    /// 1-based line number in the input file.
    pub line: usize,
    pub error: String,
}

/// Response from `gloss import`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ImportResponse {
    pub submitted: Vec<String>,
    pub approved: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

/// Response from `gloss refs check`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct ReferenceCheckResponse {
    pub checked: usize,
    pub drift: Vec<ReferenceDrift>,
    pub repaired: Vec<String>,
}
