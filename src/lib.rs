pub mod display;
pub mod models;
pub mod settings;
pub mod timeline;
pub mod timer;
mod utils;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use log::{info, warn};

use models::BlockSpec;
use settings::SettingsStore;
use timeline::build_timeline;
use timer::{SequencerController, Transition};

pub use models::{Activity, ActivityKind, PhaseTag, Segment};
pub use timeline::{Timeline, TimelineError};
pub use timer::{PlayheadSnapshot, Scheduler};

/// Options for [`run`], filled in by the CLI.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub blocks_path: PathBuf,
    pub settings_path: Option<PathBuf>,
    pub tick_interval_ms: Option<u64>,
    pub dry_run: bool,
}

pub fn init_logging() {
    // RUST_LOG overrides the info default
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}

pub fn load_blocks(path: &Path) -> Result<Vec<BlockSpec>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read blocks from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse blocks in {}", path.display()))
}

/// Build the timeline for a block file and play it in real time, printing
/// each segment as the playhead enters it.
pub async fn run(options: RunOptions) -> Result<()> {
    let store = match &options.settings_path {
        Some(path) => SettingsStore::new(path.clone())?,
        None => SettingsStore::in_memory(),
    };
    let mut playback = store.playback();
    if let Some(tick_ms) = options.tick_interval_ms {
        playback.tick_interval_ms = tick_ms;
    }

    let blocks = load_blocks(&options.blocks_path)?;
    let timeline = Arc::new(
        build_timeline(&blocks)
            .with_context(|| format!("Invalid workout in {}", options.blocks_path.display()))?,
    );

    info!(
        "Loaded {} blocks: {} activities, {} segments, {}ms",
        blocks.len(),
        timeline.activities().len(),
        timeline.len(),
        timeline.total_duration_ms()
    );

    for activity in timeline.activities() {
        let Some(block) = blocks.get(activity.block_index) else {
            continue;
        };
        println!(
            "[{:>2}] {} ({})",
            activity.index,
            display::activity_title(activity, block),
            display::format_duration_ms(timeline.activity_duration_ms(activity.index))
        );
    }
    println!("Total: {}", display::format_duration_ms(timeline.total_duration_ms()));

    if options.dry_run {
        return Ok(());
    }

    let controller = SequencerController::new(timeline.clone(), &playback);
    let mut events = controller.subscribe_events();
    print_position(&blocks, &controller.start().await);

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        print_position(&blocks, &event.snapshot);
                        if event.transition == Transition::Completed {
                            break;
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Display fell behind by {} events", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    let summary = controller.stop().await?;
    println!(
        "{} after {}",
        if summary.completed { "Done" } else { "Stopped" },
        display::format_duration_ms(summary.elapsed_ms)
    );
    Ok(())
}

fn print_position(blocks: &[BlockSpec], snapshot: &PlayheadSnapshot) {
    if snapshot.completed {
        return;
    }
    let (Some(block_index), Some(tag)) = (snapshot.block_index, snapshot.phase_tag) else {
        return;
    };
    let flipped = blocks
        .get(block_index)
        .map(|b| b.is_flipped())
        .unwrap_or(false);
    println!(
        "  rep {} {:<8} {:>3}s",
        snapshot.rep_number.unwrap_or(1),
        display::phase_label(tag, flipped),
        snapshot.remaining_whole_seconds
    );
}
