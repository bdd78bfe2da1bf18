use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use tempo_sequencer_lib::{init_logging, run, RunOptions};

/// Play a tempo workout from a JSON block list.
#[derive(Parser, Debug)]
#[command(name = "tempo-sequencer")]
#[command(about = "Countdown sequencer for tempo, 2-step and stretch blocks")]
struct Args {
    /// JSON file holding an ordered array of blocks
    blocks: PathBuf,

    /// Settings file (created on first update, defaults when missing)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Override the display tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Print the plan without playing it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();
    run(RunOptions {
        blocks_path: args.blocks,
        settings_path: args.settings,
        tick_interval_ms: args.tick_ms,
        dry_run: args.dry_run,
    })
    .await
}
