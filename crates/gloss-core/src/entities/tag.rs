use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A shared category label. Names are unique; IDs are stable once minted.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag together with the number of entries carrying it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct TagUsage {
    #[serde(flatten)]
    pub tag: Tag,
    pub entry_count: u32,
}
