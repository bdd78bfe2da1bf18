use log::debug;

use crate::models::{Activity, ActivityKind, BlockSpec, PhaseTag, Segment};

use super::error::TimelineError;
use super::types::Timeline;
use super::validate::{count, validate_block};

const MS_PER_SEC: u64 = 1_000;

/// Running state while flattening blocks into segments.
struct Cursor {
    offset_ms: u64,
    segments: Vec<Segment>,
    activities: Vec<Activity>,
}

struct Emit {
    block_index: usize,
    activity_index: usize,
    set_number: u32,
    rep_number: u32,
    phase_tag: PhaseTag,
    phase_index: usize,
    duration_ms: u64,
}

impl Cursor {
    fn new() -> Self {
        Self {
            offset_ms: 0,
            segments: Vec::new(),
            activities: Vec::new(),
        }
    }

    fn push_activity(&mut self, block_index: usize, kind: ActivityKind, name: &str, set_number: u32) -> usize {
        let index = self.activities.len();
        self.activities.push(Activity {
            index,
            block_index,
            kind,
            name: name.to_string(),
            set_number,
        });
        index
    }

    fn push_segment(&mut self, emit: Emit) -> Result<(), TimelineError> {
        let end = self
            .offset_ms
            .checked_add(emit.duration_ms)
            .ok_or(TimelineError::DurationOverflow {
                block_index: emit.block_index,
            })?;

        self.segments.push(Segment {
            block_index: emit.block_index,
            activity_index: emit.activity_index,
            set_number: emit.set_number,
            rep_number: emit.rep_number,
            phase_tag: emit.phase_tag,
            phase_index: emit.phase_index,
            duration_ms: emit.duration_ms,
            start_offset_ms: self.offset_ms,
            end_offset_ms: end,
        });
        self.offset_ms = end;
        Ok(())
    }
}

fn secs_to_ms(block_index: usize, secs: i64) -> Result<u64, TimelineError> {
    // Callers validate first, so the value is non-negative here.
    (secs as u64)
        .checked_mul(MS_PER_SEC)
        .ok_or(TimelineError::DurationOverflow { block_index })
}

/// Flatten an ordered block list into one contiguous timeline.
///
/// Every phase of every rep is emitted, including zero-length ones, so a
/// phase keeps the same index regardless of which durations a user zeroed.
pub fn build_timeline(blocks: &[BlockSpec]) -> Result<Timeline, TimelineError> {
    for (block_index, block) in blocks.iter().enumerate() {
        validate_block(block_index, block)?;
    }

    let mut cursor = Cursor::new();

    for (block_index, block) in blocks.iter().enumerate() {
        let prep_ms = secs_to_ms(block_index, block.prep_seconds)?;
        let rest_ms = secs_to_ms(block_index, block.rest_seconds)?;
        let phases = block
            .timing
            .phases()
            .into_iter()
            .map(|(tag, secs)| secs_to_ms(block_index, secs).map(|ms| (tag, ms)))
            .collect::<Result<Vec<_>, _>>()?;

        // Step 1: prep, only when there is one
        if prep_ms > 0 {
            let activity_index = cursor.push_activity(block_index, ActivityKind::Prep, "Prep", 1);
            cursor.push_segment(Emit {
                block_index,
                activity_index,
                set_number: 1,
                rep_number: 1,
                phase_tag: PhaseTag::Prep,
                phase_index: 0,
                duration_ms: prep_ms,
            })?;
        }

        // Step 2: sets, each followed by a rest except the last
        let sets = count(block_index, "sets", block.sets)?;
        let reps = count(block_index, "reps", block.reps)?;
        for set_number in 1..=sets {
            let activity_index = cursor.push_activity(
                block_index,
                ActivityKind::Exercise,
                &block.exercise_name,
                set_number,
            );

            for rep_number in 1..=reps {
                for (phase_index, (phase_tag, duration_ms)) in phases.iter().enumerate() {
                    cursor.push_segment(Emit {
                        block_index,
                        activity_index,
                        set_number,
                        rep_number,
                        phase_tag: *phase_tag,
                        phase_index,
                        duration_ms: *duration_ms,
                    })?;
                }
            }

            if set_number < sets && rest_ms > 0 {
                let activity_index =
                    cursor.push_activity(block_index, ActivityKind::Rest, "Rest", set_number);
                cursor.push_segment(Emit {
                    block_index,
                    activity_index,
                    set_number,
                    rep_number: 1,
                    phase_tag: PhaseTag::Rest,
                    phase_index: 0,
                    duration_ms: rest_ms,
                })?;
            }
        }
    }

    let timeline = Timeline {
        segments: cursor.segments,
        activities: cursor.activities,
        block_count: blocks.len(),
    };

    debug!(
        "Built timeline: {} blocks, {} activities, {} segments, {}ms total",
        timeline.block_count(),
        timeline.activities().len(),
        timeline.len(),
        timeline.total_duration_ms()
    );

    Ok(timeline)
}

/// Declared duration of a single block: prep + sets × reps × rep time + rests between sets.
pub fn block_duration_ms(block_index: usize, block: &BlockSpec) -> Result<u64, TimelineError> {
    validate_block(block_index, block)?;

    let overflow = || TimelineError::DurationOverflow { block_index };
    let rep_ms = secs_to_ms(block_index, block.timing.rep_seconds())?;
    let sets = u64::from(count(block_index, "sets", block.sets)?);
    let reps = u64::from(count(block_index, "reps", block.reps)?);
    let work_ms = rep_ms
        .checked_mul(reps)
        .and_then(|ms| ms.checked_mul(sets))
        .ok_or_else(overflow)?;
    let rest_ms = secs_to_ms(block_index, block.rest_seconds)?
        .checked_mul(sets - 1)
        .ok_or_else(overflow)?;

    secs_to_ms(block_index, block.prep_seconds)?
        .checked_add(work_ms)
        .and_then(|ms| ms.checked_add(rest_ms))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TempoTiming, TwoStepTiming};

    fn squat() -> BlockSpec {
        BlockSpec::tempo(
            "Squat",
            10,
            2,
            1,
            0,
            TempoTiming {
                down: 3,
                hold: 1,
                up: 3,
                pause: 1,
            },
        )
    }

    fn assert_contiguous(timeline: &Timeline) {
        let segments = timeline.segments();
        if let Some(first) = segments.first() {
            assert_eq!(first.start_offset_ms, 0);
        }
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_offset_ms, pair[1].start_offset_ms);
        }
        for s in segments {
            assert_eq!(s.end_offset_ms, s.start_offset_ms + s.duration_ms);
        }
    }

    #[test]
    fn single_tempo_block_layout() {
        let timeline = build_timeline(&[squat()]).unwrap();

        assert_eq!(timeline.len(), 9);
        assert_eq!(timeline.total_duration_ms(), 26_000);
        assert_contiguous(&timeline);

        let tags: Vec<PhaseTag> = timeline.segments().iter().map(|s| s.phase_tag).collect();
        assert_eq!(
            tags,
            vec![
                PhaseTag::Prep,
                PhaseTag::Down,
                PhaseTag::Hold,
                PhaseTag::Up,
                PhaseTag::Pause,
                PhaseTag::Down,
                PhaseTag::Hold,
                PhaseTag::Up,
                PhaseTag::Pause,
            ]
        );
        assert_eq!(timeline.segments()[5].rep_number, 2);
        assert_eq!(timeline.segments()[5].phase_index, 0);
        assert_eq!(timeline.activities().len(), 2);
    }

    #[test]
    fn rests_only_between_sets() {
        let block = BlockSpec::two_step(
            "Curl",
            0,
            2,
            3,
            30,
            TwoStepTiming {
                contract: 2,
                relax: 1,
            },
        );
        let timeline = build_timeline(&[block]).unwrap();

        let kinds: Vec<ActivityKind> = timeline.activities().iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::Exercise,
                ActivityKind::Rest,
                ActivityKind::Exercise,
                ActivityKind::Rest,
                ActivityKind::Exercise,
            ]
        );
        assert_eq!(timeline.segments().last().unwrap().phase_tag, PhaseTag::Relax);
        // 3 sets × 2 reps × 3s + 2 rests × 30s
        assert_eq!(timeline.total_duration_ms(), 78_000);
        assert_contiguous(&timeline);
    }

    #[test]
    fn zero_rest_and_prep_are_skipped_but_zero_phases_are_kept() {
        let block = BlockSpec::tempo(
            "Press",
            0,
            1,
            2,
            0,
            TempoTiming {
                down: 2,
                hold: 0,
                up: 2,
                pause: 0,
            },
        );
        let timeline = build_timeline(&[block]).unwrap();

        assert_eq!(timeline.len(), 8);
        assert_eq!(timeline.activities().len(), 2);
        assert_eq!(timeline.segments()[1].phase_tag, PhaseTag::Hold);
        assert_eq!(timeline.segments()[1].duration_ms, 0);
        assert_contiguous(&timeline);
    }

    #[test]
    fn activity_indices_are_global_across_blocks() {
        let stretch = BlockSpec::stretch("Hamstring", 0, 1, 0, 30);
        let timeline = build_timeline(&[squat(), stretch]).unwrap();

        assert_eq!(timeline.total_duration_ms(), 56_000);
        assert_eq!(timeline.activities().len(), 3);
        assert_eq!(timeline.activities()[2].block_index, 1);
        assert_eq!(timeline.activities()[2].name, "Hamstring");

        let last = timeline.segments().last().unwrap();
        assert_eq!(last.activity_index, 2);
        assert_eq!(last.phase_tag, PhaseTag::Stretch);
        assert_eq!(timeline.first_segment_of_activity(2), Some(9));
        assert_eq!(timeline.block_duration_ms(0), 26_000);
        assert_eq!(timeline.block_duration_ms(1), 30_000);
    }

    #[test]
    fn duration_matches_declared_totals() {
        let blocks = vec![
            squat(),
            BlockSpec::stretch("Quad", 5, 2, 15, 20),
            BlockSpec::two_step(
                "Bridge",
                3,
                10,
                4,
                45,
                TwoStepTiming {
                    contract: 3,
                    relax: 2,
                },
            ),
        ];
        let timeline = build_timeline(&blocks).unwrap();

        let declared: u64 = blocks
            .iter()
            .enumerate()
            .map(|(i, b)| block_duration_ms(i, b).unwrap())
            .sum();
        let summed: u64 = timeline.segments().iter().map(|s| s.duration_ms).sum();

        assert_eq!(summed, declared);
        assert_eq!(timeline.total_duration_ms(), declared);
        assert_contiguous(&timeline);
    }

    #[test]
    fn empty_block_list_builds_empty_timeline() {
        let timeline = build_timeline(&[]).unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline.total_duration_ms(), 0);
        assert_eq!(timeline.locate(0, 0), None);
    }

    #[test]
    fn invalid_block_prevents_build() {
        let mut bad = squat();
        bad.sets = 0;
        let err = build_timeline(&[squat(), bad]).unwrap_err();
        assert_eq!(
            err,
            TimelineError::CountBelowOne {
                block_index: 1,
                field: "sets",
                value: 0,
            }
        );
    }

    #[test]
    fn oversized_counts_are_rejected_not_truncated() {
        let mut huge = squat();
        huge.sets = 4_294_967_297;

        let expected = TimelineError::CountTooLarge {
            block_index: 0,
            field: "sets",
            value: 4_294_967_297,
            max: u32::MAX,
        };
        assert_eq!(build_timeline(&[huge.clone()]).unwrap_err(), expected);
        assert_eq!(block_duration_ms(0, &huge).unwrap_err(), expected);
    }

    #[test]
    fn locate_passes_through_zero_width_segments() {
        let block = BlockSpec::tempo(
            "Press",
            0,
            1,
            1,
            0,
            TempoTiming {
                down: 2,
                hold: 0,
                up: 2,
                pause: 0,
            },
        );
        let timeline = build_timeline(&[block]).unwrap();

        assert_eq!(timeline.locate(0, 0), Some(0));
        assert_eq!(timeline.locate(1_999, 0), Some(0));
        assert_eq!(timeline.locate(2_000, 0), Some(2));
        assert_eq!(timeline.locate(3_000, 1), Some(2));
        assert_eq!(timeline.locate(4_000, 2), None);
        // never backwards
        assert_eq!(timeline.locate(500, 2), Some(2));
    }
}
