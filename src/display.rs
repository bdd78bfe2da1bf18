//! Presentation lookups for a display layer. Nothing in the timeline or the
//! scheduler depends on this module.

use crate::models::{Activity, ActivityKind, BlockSpec, PhaseTag};

/// Label shown for a phase. A flipped tempo block shows its eccentric and
/// concentric phases the other way round; the timeline order is unchanged.
pub fn phase_label(tag: PhaseTag, flipped: bool) -> &'static str {
    match (tag, flipped) {
        (PhaseTag::Down, true) => "Up",
        (PhaseTag::Up, true) => "Down",
        (PhaseTag::Prep, _) => "Prep",
        (PhaseTag::Rest, _) => "Rest",
        (PhaseTag::Down, false) => "Down",
        (PhaseTag::Hold, _) => "Hold",
        (PhaseTag::Up, false) => "Up",
        (PhaseTag::Pause, _) => "Pause",
        (PhaseTag::Contract, _) => "Contract",
        (PhaseTag::Relax, _) => "Relax",
        (PhaseTag::Stretch, _) => "Stretch",
    }
}

/// `m:ss` for totals, plain seconds under a minute.
pub fn format_duration_ms(ms: u64) -> String {
    let secs = ms.div_ceil(1_000);
    if secs < 60 {
        return secs.to_string();
    }
    format!("{}:{:02}", secs / 60, secs % 60)
}

pub fn activity_title(activity: &Activity, block: &BlockSpec) -> String {
    match activity.kind {
        ActivityKind::Prep | ActivityKind::Rest => activity.name.clone(),
        ActivityKind::Exercise => format!(
            "{} · set {} of {} · {} reps",
            activity.name, activity.set_number, block.sets, block.reps
        ),
    }
}
