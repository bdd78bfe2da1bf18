use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Prep,
    Exercise,
    Rest,
}

/// Coarse jump target: a block's prep, one set of its exercise, or one rest between sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub index: usize,
    pub block_index: usize,
    pub kind: ActivityKind,
    pub name: String,
    pub set_number: u32,
}
