use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::Activity;
use crate::timeline::Timeline;

use super::snapshot::{PlayheadSnapshot, Tick, Transition};

// Control-path logging only; `tick` stays silent.
const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PlayheadStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
    Completed,
}

/// Mutable playback position. Owned by exactly one `Scheduler`; hosts may
/// copy it out and restore it, but never share it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayheadState {
    /// Wall-clock instant of timeline offset 0. Signed because a seek can
    /// place it before the clock's origin.
    pub anchor_wall_clock_ms: i64,
    pub accumulated_pause_ms: u64,
    pub pause_started_at_ms: Option<u64>,
    pub started: bool,
    pub running: bool,
    pub locked: bool,
    pub completed: bool,
    pub current_segment_index: usize,
    pub last_elapsed_ms: u64,
    #[serde(default)]
    pub completion_reported: bool,
}

impl PlayheadState {
    pub fn status(&self) -> PlayheadStatus {
        match (self.started, self.completed, self.running, self.pause_started_at_ms) {
            (false, _, _, _) => PlayheadStatus::Idle,
            (true, true, _, _) => PlayheadStatus::Completed,
            (true, false, false, _) => PlayheadStatus::Stopped,
            (true, false, true, Some(_)) => PlayheadStatus::Paused,
            (true, false, true, None) => PlayheadStatus::Running,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started_at_ms.is_some()
    }

    /// Elapsed timeline time at `now_ms`; frozen at the pause instant while paused.
    pub fn elapsed_at(&self, now_ms: u64) -> u64 {
        let effective_now = self.pause_started_at_ms.unwrap_or(now_ms) as i64;
        let elapsed = effective_now - self.anchor_wall_clock_ms - self.accumulated_pause_ms as i64;
        elapsed.max(0) as u64
    }
}

/// Drives a playhead through an immutable timeline.
///
/// Every operation takes the current clock reading explicitly and either
/// applies fully or returns `false` without touching the state.
#[derive(Debug, Clone)]
pub struct Scheduler {
    timeline: Arc<Timeline>,
    state: PlayheadState,
}

impl Scheduler {
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            state: PlayheadState::default(),
        }
    }

    /// Resume from a state previously copied out with [`Scheduler::state`].
    pub fn from_state(timeline: Arc<Timeline>, state: PlayheadState) -> Self {
        Self { timeline, state }
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn state(&self) -> &PlayheadState {
        &self.state
    }

    pub fn status(&self) -> PlayheadStatus {
        self.state.status()
    }

    /// Whether a driving loop still has work: advancing a running playhead,
    /// or delivering a completion nobody has seen yet.
    pub fn needs_ticks(&self) -> bool {
        match self.status() {
            PlayheadStatus::Running => true,
            PlayheadStatus::Completed => !self.state.completion_reported,
            _ => false,
        }
    }

    pub fn start(&mut self, now_ms: u64) -> bool {
        if self.state.started {
            log_debug!("start ignored: playhead already started");
            return false;
        }

        self.state = PlayheadState {
            anchor_wall_clock_ms: now_ms as i64,
            started: true,
            running: true,
            locked: self.state.locked,
            ..PlayheadState::default()
        };

        if self.timeline.total_duration_ms() == 0 {
            // Nothing to play; the first tick reports completion.
            self.finish();
        }

        log_debug!(
            "playhead started at {}ms over {} segments",
            now_ms,
            self.timeline.len()
        );
        true
    }

    pub fn tick(&mut self, now_ms: u64) -> Tick {
        if self.state.completed {
            let transition = if self.state.completion_reported {
                None
            } else {
                self.state.completion_reported = true;
                Some(Transition::Completed)
            };
            return Tick {
                snapshot: self.snapshot(),
                transition,
            };
        }

        if !self.state.running || self.state.is_paused() {
            return Tick {
                snapshot: self.snapshot(),
                transition: None,
            };
        }

        let elapsed = self.state.elapsed_at(now_ms);
        let from = self.state.current_segment_index;

        let transition = match self.timeline.locate(elapsed, from) {
            Some(index) => {
                self.state.current_segment_index = index;
                self.state.last_elapsed_ms = elapsed;
                (index != from).then_some(Transition::SegmentChanged { from, to: index })
            }
            None => {
                self.finish();
                self.state.completion_reported = true;
                Some(Transition::Completed)
            }
        };

        Tick {
            snapshot: self.snapshot(),
            transition,
        }
    }

    pub fn pause(&mut self, now_ms: u64) -> bool {
        if !self.state.running || self.state.is_paused() {
            log_debug!("pause ignored: playhead not running");
            return false;
        }
        self.state.pause_started_at_ms = Some(now_ms);
        true
    }

    pub fn resume(&mut self, now_ms: u64) -> bool {
        let Some(paused_at) = self.state.pause_started_at_ms else {
            log_debug!("resume ignored: playhead not paused");
            return false;
        };
        self.state.accumulated_pause_ms = self
            .state
            .accumulated_pause_ms
            .saturating_add(now_ms.saturating_sub(paused_at));
        self.state.pause_started_at_ms = None;
        true
    }

    /// Jump to the first segment of `activity_index`. Ignored while locked,
    /// before start, after completion, and for unknown activities.
    pub fn seek(&mut self, activity_index: usize, now_ms: u64) -> bool {
        if self.state.locked {
            log_debug!("seek to activity {} ignored: locked", activity_index);
            return false;
        }
        if !self.state.running {
            log_debug!("seek to activity {} ignored: not running", activity_index);
            return false;
        }
        let Some(index) = self.timeline.first_segment_of_activity(activity_index) else {
            log_debug!("seek ignored: unknown activity {}", activity_index);
            return false;
        };

        self.jump_to_segment(index, now_ms);
        log_debug!("seeked to activity {} (segment {})", activity_index, index);
        true
    }

    /// End an unfinished run where it stands. The position freezes at `now_ms`
    /// and every later control call is ignored.
    pub fn stop(&mut self, now_ms: u64) -> bool {
        if !self.state.running {
            log_debug!("stop ignored: playhead not running");
            return false;
        }

        let elapsed = self.state.elapsed_at(now_ms);
        match self.timeline.locate(elapsed, self.state.current_segment_index) {
            Some(index) => {
                self.state.current_segment_index = index;
                self.state.last_elapsed_ms = elapsed;
                self.state.running = false;
                self.state.pause_started_at_ms = None;
            }
            // Ran out before anyone ticked; that is a completion, not a stop.
            None => self.finish(),
        }
        true
    }

    pub fn lock(&mut self) {
        self.state.locked = true;
    }

    pub fn unlock(&mut self) {
        self.state.locked = false;
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.state.locked = !self.state.locked;
        self.state.locked
    }

    /// Swap in a rebuilt timeline. An active playhead keeps its elapsed offset
    /// as long as that offset still lands in the same activity (same block,
    /// kind and set). Otherwise it moves to the start of that activity in the
    /// new timeline, or keeps the offset if the activity is gone.
    pub fn replace_timeline(&mut self, timeline: Arc<Timeline>, now_ms: u64) {
        if !self.state.running {
            self.timeline = timeline;
            if self.state.completed {
                self.state.current_segment_index = self.timeline.len().saturating_sub(1);
                self.state.last_elapsed_ms = self.timeline.total_duration_ms();
            } else if !self.state.started {
                self.state.current_segment_index = 0;
                self.state.last_elapsed_ms = 0;
            } else {
                self.state.current_segment_index = self
                    .timeline
                    .locate(self.state.last_elapsed_ms, 0)
                    .unwrap_or(self.timeline.len().saturating_sub(1));
            }
            return;
        }

        let elapsed = self.state.elapsed_at(now_ms);
        let activity = self.activity_at(self.state.current_segment_index).cloned();
        self.timeline = timeline;

        let located = self.timeline.locate(elapsed, 0);
        let same_activity = match (&activity, located) {
            (Some(old), Some(index)) => self
                .activity_at(index)
                .is_some_and(|new| same_identity(old, new)),
            _ => false,
        };

        if !same_activity {
            let resolved = activity
                .and_then(|a| self.timeline.find_activity(a.block_index, a.kind, a.set_number))
                .and_then(|a| self.timeline.first_segment_of_activity(a));
            if let Some(index) = resolved {
                log_debug!("rebuild moved playhead to segment {}", index);
                self.jump_to_segment(index, now_ms);
                return;
            }
        }

        self.state.anchor_wall_clock_ms = now_ms as i64 - elapsed as i64;
        self.state.accumulated_pause_ms = 0;
        if self.state.is_paused() {
            self.state.pause_started_at_ms = Some(now_ms);
        }
        match located {
            Some(index) => {
                self.state.current_segment_index = index;
                self.state.last_elapsed_ms = elapsed;
            }
            None => self.finish(),
        }
    }

    pub fn snapshot(&self) -> PlayheadSnapshot {
        let state = &self.state;
        let segment = self.timeline.segment(state.current_segment_index);
        let remaining_ms = match (state.completed, segment) {
            (true, _) | (_, None) => 0,
            (false, Some(s)) => s.end_offset_ms.saturating_sub(state.last_elapsed_ms),
        };

        PlayheadSnapshot {
            block_index: segment.map(|s| s.block_index),
            activity_index: segment.map(|s| s.activity_index),
            set_number: segment.map(|s| s.set_number),
            rep_number: segment.map(|s| s.rep_number),
            phase_tag: segment.map(|s| s.phase_tag),
            segment_duration_ms: segment.map(|s| s.duration_ms).unwrap_or(0),
            remaining_ms,
            remaining_whole_seconds: remaining_ms.div_ceil(1_000),
            total_elapsed_ms: state.last_elapsed_ms,
            current_segment_index: state.current_segment_index,
            total_segments: self.timeline.len(),
            total_duration_ms: self.timeline.total_duration_ms(),
            running: state.running,
            paused: state.is_paused(),
            locked: state.locked,
            completed: state.completed,
        }
    }

    fn jump_to_segment(&mut self, index: usize, now_ms: u64) {
        let start = self
            .timeline
            .segment(index)
            .map(|s| s.start_offset_ms)
            .unwrap_or(0);

        self.state.anchor_wall_clock_ms = now_ms as i64 - start as i64;
        self.state.accumulated_pause_ms = 0;
        // Land on the phase that actually plays first, past zero-length ones.
        self.state.current_segment_index = self.timeline.locate(start, index).unwrap_or(index);
        self.state.last_elapsed_ms = start;
        if self.state.is_paused() {
            self.state.pause_started_at_ms = Some(now_ms);
        }
    }

    fn activity_at(&self, segment_index: usize) -> Option<&Activity> {
        self.timeline
            .segment(segment_index)
            .and_then(|s| self.timeline.activities().get(s.activity_index))
    }

    fn finish(&mut self) {
        self.state.running = false;
        self.state.completed = true;
        self.state.pause_started_at_ms = None;
        self.state.current_segment_index = self.timeline.len().saturating_sub(1);
        self.state.last_elapsed_ms = self.timeline.total_duration_ms();
    }
}

fn same_identity(a: &Activity, b: &Activity) -> bool {
    a.block_index == b.block_index && a.kind == b.kind && a.set_number == b.set_number
}
