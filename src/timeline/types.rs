use serde::Serialize;

use crate::models::{Activity, ActivityKind, Segment};

/// The flattened, immutable timeline of a whole workout.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub(super) segments: Vec<Segment>,
    pub(super) activities: Vec<Activity>,
    pub(super) block_count: usize,
}

impl Timeline {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.segments.last().map(|s| s.end_offset_ms).unwrap_or(0)
    }

    /// Index of the first segment belonging to `activity_index`.
    pub fn first_segment_of_activity(&self, activity_index: usize) -> Option<usize> {
        self.segments
            .iter()
            .position(|s| s.activity_index == activity_index)
    }

    /// Index of the activity with this identity, if the timeline has one.
    pub fn find_activity(&self, block_index: usize, kind: ActivityKind, set_number: u32) -> Option<usize> {
        self.activities
            .iter()
            .find(|a| a.block_index == block_index && a.kind == kind && a.set_number == set_number)
            .map(|a| a.index)
    }

    pub fn activity_duration_ms(&self, activity_index: usize) -> u64 {
        self.segments
            .iter()
            .filter(|s| s.activity_index == activity_index)
            .map(|s| s.duration_ms)
            .sum()
    }

    pub fn block_duration_ms(&self, block_index: usize) -> u64 {
        self.segments
            .iter()
            .filter(|s| s.block_index == block_index)
            .map(|s| s.duration_ms)
            .sum()
    }

    /// Find the segment active at `elapsed_ms`, scanning forward from `from`.
    ///
    /// Never moves backward: if `elapsed_ms` lies before `segments[from]` the
    /// result is `from`. Returns `None` once `elapsed_ms` reaches the end of the
    /// timeline.
    pub fn locate(&self, elapsed_ms: u64, from: usize) -> Option<usize> {
        if elapsed_ms >= self.total_duration_ms() {
            return None;
        }

        let last = self.segments.len() - 1;
        let mut index = from.min(last);
        while index < last {
            let segment = &self.segments[index];
            if segment.contains(elapsed_ms) || segment.start_offset_ms > elapsed_ms {
                break;
            }
            index += 1;
        }
        Some(index)
    }
}
