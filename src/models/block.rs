use serde::{Deserialize, Serialize};

use super::PhaseTag;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TempoTiming {
    pub down: i64,
    pub hold: i64,
    pub up: i64,
    pub pause: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TwoStepTiming {
    pub contract: i64,
    pub relax: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StretchTiming {
    pub hold: i64,
}

/// Timing payload of a block, tagged by `blockType` on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "blockType")]
pub enum BlockTiming {
    #[serde(rename = "tempo")]
    Tempo {
        tempo: TempoTiming,
        /// Display-only. Never consulted when building or playing a timeline.
        #[serde(rename = "tempoFlipped", default)]
        flipped: bool,
    },
    #[serde(rename = "2-step")]
    TwoStep {
        #[serde(rename = "twoStep")]
        two_step: TwoStepTiming,
    },
    #[serde(rename = "stretch")]
    Stretch { stretch: StretchTiming },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Tempo,
    TwoStep,
    Stretch,
}

impl BlockTiming {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockTiming::Tempo { .. } => BlockKind::Tempo,
            BlockTiming::TwoStep { .. } => BlockKind::TwoStep,
            BlockTiming::Stretch { .. } => BlockKind::Stretch,
        }
    }

    /// Phases of one rep in canonical order, zero-length phases included.
    pub fn phases(&self) -> Vec<(PhaseTag, i64)> {
        match *self {
            BlockTiming::Tempo { tempo, .. } => vec![
                (PhaseTag::Down, tempo.down),
                (PhaseTag::Hold, tempo.hold),
                (PhaseTag::Up, tempo.up),
                (PhaseTag::Pause, tempo.pause),
            ],
            BlockTiming::TwoStep { two_step } => vec![
                (PhaseTag::Contract, two_step.contract),
                (PhaseTag::Relax, two_step.relax),
            ],
            BlockTiming::Stretch { stretch } => vec![(PhaseTag::Stretch, stretch.hold)],
        }
    }

    pub fn rep_seconds(&self) -> i64 {
        self.phases().iter().map(|(_, secs)| *secs).sum()
    }
}

/// One exercise's full specification as handed over by the block editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub exercise_name: String,
    pub prep_seconds: i64,
    pub reps: i64,
    pub sets: i64,
    pub rest_seconds: i64,
    #[serde(flatten)]
    pub timing: BlockTiming,
}

impl BlockSpec {
    pub fn tempo(name: &str, prep: i64, reps: i64, sets: i64, rest: i64, tempo: TempoTiming) -> Self {
        Self {
            id: None,
            exercise_name: name.to_string(),
            prep_seconds: prep,
            reps,
            sets,
            rest_seconds: rest,
            timing: BlockTiming::Tempo {
                tempo,
                flipped: false,
            },
        }
    }

    pub fn two_step(name: &str, prep: i64, reps: i64, sets: i64, rest: i64, two_step: TwoStepTiming) -> Self {
        Self {
            id: None,
            exercise_name: name.to_string(),
            prep_seconds: prep,
            reps,
            sets,
            rest_seconds: rest,
            timing: BlockTiming::TwoStep { two_step },
        }
    }

    pub fn stretch(name: &str, prep: i64, sets: i64, rest: i64, hold: i64) -> Self {
        Self {
            id: None,
            exercise_name: name.to_string(),
            prep_seconds: prep,
            reps: 1,
            sets,
            rest_seconds: rest,
            timing: BlockTiming::Stretch {
                stretch: StretchTiming { hold },
            },
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.timing.kind()
    }

    pub fn is_flipped(&self) -> bool {
        matches!(self.timing, BlockTiming::Tempo { flipped: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tempo_block_with_missing_flip_flag() {
        let json = r#"{
            "id": "b1",
            "exerciseName": "Squat",
            "prepSeconds": 10,
            "reps": 8,
            "sets": 3,
            "restSeconds": 90,
            "blockType": "tempo",
            "tempo": { "down": 3, "hold": 1, "up": 3, "pause": 1 }
        }"#;

        let block: BlockSpec = serde_json::from_str(json).unwrap();
        assert_eq!(block.kind(), BlockKind::Tempo);
        assert!(!block.is_flipped());
        assert_eq!(block.timing.rep_seconds(), 8);
        assert_eq!(block.id.as_deref(), Some("b1"));
    }

    #[test]
    fn parses_two_step_and_stretch_blocks() {
        let two_step = r#"{
            "exerciseName": "Plank",
            "prepSeconds": 0,
            "reps": 5,
            "sets": 1,
            "restSeconds": 0,
            "blockType": "2-step",
            "twoStep": { "contract": 4, "relax": 2 }
        }"#;
        let stretch = r#"{
            "exerciseName": "Hamstring",
            "prepSeconds": 5,
            "reps": 1,
            "sets": 2,
            "restSeconds": 10,
            "blockType": "stretch",
            "stretch": { "hold": 30 }
        }"#;

        let two_step: BlockSpec = serde_json::from_str(two_step).unwrap();
        let stretch: BlockSpec = serde_json::from_str(stretch).unwrap();

        assert_eq!(
            two_step.timing.phases(),
            vec![(PhaseTag::Contract, 4), (PhaseTag::Relax, 2)]
        );
        assert_eq!(stretch.timing.phases(), vec![(PhaseTag::Stretch, 30)]);
    }

    #[test]
    fn negative_values_survive_parsing_for_validation() {
        let json = r#"{
            "exerciseName": "Bad",
            "prepSeconds": -1,
            "reps": 0,
            "sets": 1,
            "restSeconds": 0,
            "blockType": "stretch",
            "stretch": { "hold": 5 }
        }"#;

        let block: BlockSpec = serde_json::from_str(json).unwrap();
        assert_eq!(block.prep_seconds, -1);
        assert_eq!(block.reps, 0);
    }

    #[test]
    fn tempo_phases_keep_zero_durations() {
        let timing = BlockTiming::Tempo {
            tempo: TempoTiming {
                down: 2,
                hold: 0,
                up: 2,
                pause: 0,
            },
            flipped: true,
        };
        let tags: Vec<PhaseTag> = timing.phases().into_iter().map(|(tag, _)| tag).collect();
        assert_eq!(
            tags,
            vec![PhaseTag::Down, PhaseTag::Hold, PhaseTag::Up, PhaseTag::Pause]
        );
    }
}
