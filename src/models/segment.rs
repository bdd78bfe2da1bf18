use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PhaseTag {
    Prep,
    Rest,
    Down,
    Hold,
    Up,
    Pause,
    Contract,
    Relax,
    Stretch,
}

impl PhaseTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseTag::Prep => "prep",
            PhaseTag::Rest => "rest",
            PhaseTag::Down => "down",
            PhaseTag::Hold => "hold",
            PhaseTag::Up => "up",
            PhaseTag::Pause => "pause",
            PhaseTag::Contract => "contract",
            PhaseTag::Relax => "relax",
            PhaseTag::Stretch => "stretch",
        }
    }
}

/// One atomic timed unit of the flattened timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub block_index: usize,
    pub activity_index: usize,
    pub set_number: u32,
    pub rep_number: u32,
    pub phase_tag: PhaseTag,
    /// Position within the block's canonical phase order; 0 for prep and rest.
    pub phase_index: usize,
    pub duration_ms: u64,
    pub start_offset_ms: u64,
    pub end_offset_ms: u64,
}

impl Segment {
    /// Whether `elapsed_ms` falls inside `[start, end)`. Zero-width segments never contain anything.
    pub fn contains(&self, elapsed_ms: u64) -> bool {
        self.start_offset_ms <= elapsed_ms && elapsed_ms < self.end_offset_ms
    }
}
