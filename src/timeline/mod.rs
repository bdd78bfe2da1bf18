pub mod builder;
pub mod error;
pub mod types;
pub mod validate;

pub use builder::{block_duration_ms, build_timeline};
pub use error::TimelineError;
pub use types::Timeline;
