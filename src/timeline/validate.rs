use crate::models::BlockSpec;

use super::error::TimelineError;

/// Reject a malformed block. Nothing is clamped: the first bad field wins.
pub fn validate_block(block_index: usize, block: &BlockSpec) -> Result<(), TimelineError> {
    non_negative(block_index, "prepSeconds", block.prep_seconds)?;
    non_negative(block_index, "restSeconds", block.rest_seconds)?;
    count(block_index, "reps", block.reps)?;
    count(block_index, "sets", block.sets)?;

    for (tag, secs) in block.timing.phases() {
        non_negative(block_index, tag.as_str(), secs)?;
    }

    Ok(())
}

fn non_negative(block_index: usize, field: &'static str, value: i64) -> Result<(), TimelineError> {
    if value < 0 {
        return Err(TimelineError::NegativeDuration {
            block_index,
            field,
            value,
        });
    }
    Ok(())
}

/// Repetition counts must fit the `u32` set and rep numbers of a segment.
pub(super) fn count(block_index: usize, field: &'static str, value: i64) -> Result<u32, TimelineError> {
    if value < 1 {
        return Err(TimelineError::CountBelowOne {
            block_index,
            field,
            value,
        });
    }
    u32::try_from(value).map_err(|_| TimelineError::CountTooLarge {
        block_index,
        field,
        value,
        max: u32::MAX,
    })
}
