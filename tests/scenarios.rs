use std::path::Path;
use std::sync::Arc;

use tempo_sequencer_lib::load_blocks;
use tempo_sequencer_lib::models::{BlockSpec, PhaseTag, TempoTiming};
use tempo_sequencer_lib::timeline::{block_duration_ms, build_timeline, TimelineError};
use tempo_sequencer_lib::timer::{Clock, ManualClock, Scheduler, Transition};

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

#[test]
fn single_tempo_block() {
    let timeline = Arc::new(build_timeline(&[squat()]).unwrap());
    assert_eq!(timeline.len(), 9);
    assert_eq!(timeline.total_duration_ms(), 26_000);

    let clock = ManualClock::new(0);
    let mut scheduler = Scheduler::new(timeline);
    scheduler.start(clock.now_ms());

    clock.advance(10_500);
    let snap = scheduler.tick(clock.now_ms()).snapshot;
    assert_eq!(snap.rep_number, Some(1));
    assert_eq!(snap.phase_tag, Some(PhaseTag::Down));
    assert_eq!(snap.remaining_ms, 2_500);
}

#[test]
fn two_blocks_with_seek_into_the_second() {
    let stretch = BlockSpec::stretch("Hamstring", 0, 1, 0, 30);
    let timeline = Arc::new(build_timeline(&[squat(), stretch]).unwrap());
    assert_eq!(timeline.total_duration_ms(), 56_000);

    let stretch_activity = timeline
        .activities()
        .iter()
        .find(|a| a.block_index == 1)
        .map(|a| a.index)
        .unwrap();

    let clock = ManualClock::new(1_000);
    let mut scheduler = Scheduler::new(timeline);
    scheduler.start(clock.now_ms());
    clock.advance(4_321);
    scheduler.tick(clock.now_ms());

    assert!(scheduler.seek(stretch_activity, clock.now_ms()));
    let snap = scheduler.tick(clock.now_ms()).snapshot;
    assert_eq!(snap.block_index, Some(1));
    assert_eq!(snap.phase_tag, Some(PhaseTag::Stretch));
    assert_eq!(snap.remaining_ms, 30_000);
}

#[test]
fn all_zero_block_completes_immediately() {
    let zero = BlockSpec::tempo(
        "Zero",
        0,
        1,
        1,
        0,
        TempoTiming {
            down: 0,
            hold: 0,
            up: 0,
            pause: 0,
        },
    );
    let mut scheduler = Scheduler::new(Arc::new(build_timeline(&[zero]).unwrap()));
    scheduler.start(500);

    let tick = scheduler.tick(500);
    assert!(tick.snapshot.completed);
    assert_eq!(tick.snapshot.remaining_ms, 0);
    assert_eq!(tick.transition, Some(Transition::Completed));
}

#[test]
fn seek_to_zero_length_phase_reports_next_nonzero_segment() {
    // The second set starts with a zero-length down phase.
    let block = BlockSpec::tempo(
        "Pull-up",
        0,
        1,
        2,
        0,
        TempoTiming {
            down: 0,
            hold: 2,
            up: 3,
            pause: 0,
        },
    );
    let mut scheduler = Scheduler::new(Arc::new(build_timeline(&[block]).unwrap()));
    scheduler.start(0);
    scheduler.tick(100);

    assert!(scheduler.seek(1, 200));
    let snap = scheduler.tick(200).snapshot;
    assert_eq!(snap.activity_index, Some(1));
    assert_eq!(snap.phase_tag, Some(PhaseTag::Hold));
    assert_eq!(snap.remaining_ms, 2_000);
}

#[test]
fn completion_is_idempotent_over_later_ticks() {
    let mut scheduler = Scheduler::new(Arc::new(build_timeline(&[squat()]).unwrap()));
    scheduler.start(0);

    let mut completions = 0;
    let mut terminal = None;
    for now in (0..60_000).step_by(250) {
        let tick = scheduler.tick(now);
        if tick.transition == Some(Transition::Completed) {
            completions += 1;
        }
        if tick.snapshot.completed {
            if let Some(first) = &terminal {
                assert_eq!(&tick.snapshot, first);
            } else {
                terminal = Some(tick.snapshot.clone());
            }
            assert_eq!(tick.snapshot.remaining_ms, 0);
        }
    }
    assert_eq!(completions, 1);
}

#[test]
fn validation_errors_stop_the_build() {
    let mut negative_rest = squat();
    negative_rest.rest_seconds = -30;
    assert!(matches!(
        build_timeline(&[negative_rest]),
        Err(TimelineError::NegativeDuration {
            field: "restSeconds",
            ..
        })
    ));
}

#[test]
fn demo_workout_loads_and_conserves_duration() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/leg_day.json");
    let blocks = load_blocks(&path).unwrap();
    assert_eq!(blocks.len(), 3);

    let timeline = build_timeline(&blocks).unwrap();
    let declared: u64 = blocks
        .iter()
        .enumerate()
        .map(|(i, b)| block_duration_ms(i, b).unwrap())
        .sum();
    assert_eq!(timeline.total_duration_ms(), declared);

    for pair in timeline.segments().windows(2) {
        assert_eq!(pair[0].end_offset_ms, pair[1].start_offset_ms);
    }
}
