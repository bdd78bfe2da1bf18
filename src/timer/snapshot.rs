use serde::Serialize;

use crate::models::PhaseTag;

/// Read-only view of the playhead handed to the display layer on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayheadSnapshot {
    /// Position fields are `None` only when the timeline has no segments.
    pub block_index: Option<usize>,
    pub activity_index: Option<usize>,
    pub set_number: Option<u32>,
    pub rep_number: Option<u32>,
    pub phase_tag: Option<PhaseTag>,
    pub segment_duration_ms: u64,
    pub remaining_ms: u64,
    /// Countdown value: `remaining_ms` rounded up to whole seconds.
    pub remaining_whole_seconds: u64,
    pub total_elapsed_ms: u64,
    pub current_segment_index: usize,
    pub total_segments: usize,
    pub total_duration_ms: u64,
    pub running: bool,
    pub paused: bool,
    pub locked: bool,
    pub completed: bool,
}

impl PlayheadSnapshot {
    /// Fraction of the current segment already played, in `[0, 1]`.
    pub fn segment_progress(&self) -> f64 {
        if self.segment_duration_ms == 0 {
            return 1.0;
        }
        let played = self.segment_duration_ms.saturating_sub(self.remaining_ms);
        played as f64 / self.segment_duration_ms as f64
    }

    /// Fraction of the whole workout already played, in `[0, 1]`.
    pub fn workout_progress(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 1.0;
        }
        (self.total_elapsed_ms.min(self.total_duration_ms)) as f64 / self.total_duration_ms as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum Transition {
    /// The playhead entered a new segment. `from` and `to` are segment indices.
    SegmentChanged { from: usize, to: usize },
    /// Reported exactly once, on the tick that reaches the end of the timeline.
    Completed,
}

/// Result of one `tick`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub snapshot: PlayheadSnapshot,
    pub transition: Option<Transition>,
}
