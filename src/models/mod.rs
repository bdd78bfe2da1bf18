mod activity;
mod block;
mod segment;

pub use activity::{Activity, ActivityKind};
pub use block::{BlockKind, BlockSpec, BlockTiming, StretchTiming, TempoTiming, TwoStepTiming};
pub use segment::{PhaseTag, Segment};
