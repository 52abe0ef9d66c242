use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{SubmissionKind, SubmissionStatus};
use crate::payload::SubmissionPayload;

/// Who proposed a submission. Untrusted, stored verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Submitter {
    pub name: String,
    pub email: Option<String>,
}

/// A proposed creation or edit awaiting moderation.
///
/// The payload is flattened, so the JSON shape is
/// `{"id": .., "kind": "edit", "data": {..}, "submitter": {..}, "status": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Submission {
    pub id: String,
    #[serde(flatten)]
    pub payload: SubmissionPayload,
    pub submitter: Submitter,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub review_note: Option<String>,
}

impl Submission {
    #[must_use]
    pub const fn kind(&self) -> SubmissionKind {
        self.payload.kind()
    }
}
