use serde::{Deserialize, Serialize};

use crate::stimulus::StimulusKind;
use crate::task::{BlockPhase, TaskType};
use crate::trial::TrialResult;

/// Session record as persisted by the host. The engine itself only
/// needs the opaque id to stamp onto results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub participant_id: String,
    pub task_type: TaskType,
    pub phase: BlockPhase,
    pub started_at_epoch_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at_epoch_ms: Option<u64>,
}

/// Per-kind accuracy and mean reaction time over a finished block.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KindSummary {
    pub total: usize,
    pub responded: usize,
    pub correct: usize,
    pub mean_reaction_time_ms: Option<f64>,
}

impl KindSummary {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Descriptive statistics over one block's results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BlockSummary {
    pub overall: KindSummary,
    pub word: KindSummary,
    pub nonword: KindSummary,
    pub pm_cue: KindSummary,
}

impl BlockSummary {
    pub fn from_results(results: &[TrialResult]) -> Self {
        let mut summary = Self::default();
        let mut rt_sums = [0.0f64; 4];
        let mut rt_counts = [0usize; 4];

        for result in results {
            let slot = match result.stimulus_kind {
                StimulusKind::Word => 1,
                StimulusKind::NonWord => 2,
                StimulusKind::PmCue => 3,
            };
            for idx in [0, slot] {
                let bucket = summary.bucket_mut(idx);
                bucket.total += 1;
                if result.responded {
                    bucket.responded += 1;
                }
                if result.correct {
                    bucket.correct += 1;
                }
                if let Some(rt) = result.reaction_time_ms {
                    rt_sums[idx] += rt;
                    rt_counts[idx] += 1;
                }
            }
        }

        for idx in 0..4 {
            if rt_counts[idx] > 0 {
                summary.bucket_mut(idx).mean_reaction_time_ms =
                    Some(rt_sums[idx] / rt_counts[idx] as f64);
            }
        }
        summary
    }

    fn bucket_mut(&mut self, idx: usize) -> &mut KindSummary {
        match idx {
            0 => &mut self.overall,
            1 => &mut self.word,
            2 => &mut self.nonword,
            _ => &mut self.pm_cue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(kind: StimulusKind, correct: bool, rt: Option<f64>) -> TrialResult {
        TrialResult {
            session_id: "s".into(),
            trial_index: 0,
            stimulus_text: "X".into(),
            stimulus_kind: kind,
            expected_key: 'n',
            pressed_key: rt.map(|_| 'n'),
            correct,
            reaction_time_ms: rt,
            responded: rt.is_some(),
            fixation_duration_ms: 500,
            captured_at_epoch_ms: 0,
        }
    }

    #[test]
    fn summary_splits_by_kind_and_averages_rt() {
        let results = vec![
            result(StimulusKind::Word, true, Some(400.0)),
            result(StimulusKind::Word, false, Some(600.0)),
            result(StimulusKind::NonWord, true, Some(500.0)),
            result(StimulusKind::PmCue, false, None),
        ];
        let summary = BlockSummary::from_results(&results);
        assert_eq!(summary.overall.total, 4);
        assert_eq!(summary.overall.responded, 3);
        assert_eq!(summary.overall.correct, 2);
        assert_eq!(summary.word.mean_reaction_time_ms, Some(500.0));
        assert_eq!(summary.pm_cue.mean_reaction_time_ms, None);
        assert!((summary.word.accuracy() - 0.5).abs() < f64::EPSILON);
    }
}
