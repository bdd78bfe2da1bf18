use thiserror::Error;

/// Reasons a block list is rejected before any timeline is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("block {block_index}: {field} must not be negative (got {value})")]
    NegativeDuration {
        block_index: usize,
        field: &'static str,
        value: i64,
    },

    #[error("block {block_index}: {field} must be at least 1 (got {value})")]
    CountBelowOne {
        block_index: usize,
        field: &'static str,
        value: i64,
    },

    #[error("block {block_index}: {field} must be at most {max} (got {value})")]
    CountTooLarge {
        block_index: usize,
        field: &'static str,
        value: i64,
        max: u32,
    },

    #[error("block {block_index}: timeline duration overflows")]
    DurationOverflow { block_index: usize },
}
