use serde::{Deserialize, Serialize};

use lexpm_core::{nonword_pool, pm_cues, training_nonwords, training_words, word_pool};
use lexpm_core::{BlockPhase, TaskType};

use crate::sequence::SequenceError;

/// Counts and spacing rules for block generation. The repository this
/// task descends from shipped several variants of these constants
/// (10 vs 16 PM trials, different spacing), so none are hardcoded at
/// use sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    /// Word/non-word pairs per main block; plain trials = 2x this.
    pub ld_pairs_per_block: usize,
    pub pm_trials_per_block: usize,
    /// Plain trials required before the first PM cue.
    pub min_ld_before_first_pm: usize,
    /// Plain trials required between consecutive PM cues.
    pub min_ld_between_pm: usize,
    /// Chance of inserting a pending PM cue at an eligible step.
    pub pm_insert_probability: f64,
    /// Word/non-word pairs in a training run.
    pub training_pairs: usize,
    /// Insertion slots for the two training cues, applied in order to
    /// the growing list (the second slot sees the first cue already in
    /// place).
    pub training_cue_slots: [usize; 2],
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            ld_pairs_per_block: 80,
            pm_trials_per_block: 10,
            min_ld_before_first_pm: 5,
            min_ld_between_pm: 5,
            pm_insert_probability: 0.3,
            training_pairs: 5,
            training_cue_slots: [4, 9],
        }
    }
}

impl SequenceConfig {
    pub fn plain_trials_per_block(&self) -> usize {
        self.ld_pairs_per_block * 2
    }

    /// Fails fast on pool depletion or spacing rules that cannot be
    /// satisfied, before any trial is generated.
    pub fn validate_main(&self, task: TaskType, phase: BlockPhase) -> Result<(), SequenceError> {
        let words = word_pool(phase).len();
        let nonwords = nonword_pool(phase).len();
        if self.ld_pairs_per_block > words || self.ld_pairs_per_block > nonwords {
            return Err(SequenceError::PoolExhausted {
                requested: self.ld_pairs_per_block,
                available: words.min(nonwords),
            });
        }
        if !(0.0..=1.0).contains(&self.pm_insert_probability) {
            return Err(SequenceError::InvalidProbability(self.pm_insert_probability));
        }
        if task.has_pm_component() && self.pm_trials_per_block > 0 {
            let required = self.min_ld_before_first_pm
                + (self.pm_trials_per_block - 1) * self.min_ld_between_pm;
            let plain = self.plain_trials_per_block();
            if required > plain {
                return Err(SequenceError::InfeasibleSpacing { required, plain });
            }
        }
        Ok(())
    }

    pub fn validate_training(&self, task: TaskType) -> Result<(), SequenceError> {
        let words = training_words().len();
        let nonwords = training_nonwords().len();
        if self.training_pairs > words || self.training_pairs > nonwords {
            return Err(SequenceError::PoolExhausted {
                requested: self.training_pairs,
                available: words.min(nonwords),
            });
        }
        if task.has_pm_component() {
            if pm_cues().len() < 2 {
                return Err(SequenceError::PoolExhausted {
                    requested: 2,
                    available: pm_cues().len(),
                });
            }
            // Slots index into the list as it grows by one per insert.
            let len = self.training_pairs * 2;
            let [first, second] = self.training_cue_slots;
            if first > len || second > len + 1 {
                return Err(SequenceError::CueSlotOutOfRange {
                    slot: first.max(second),
                    len,
                });
            }
        }
        Ok(())
    }
}

/// Presentation timings for the trial engine, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidate fixation durations; one is drawn per trial.
    pub fixation_durations_ms: Vec<u64>,
    /// Maximum response window after stimulus onset.
    pub stimulus_window_ms: u64,
    /// Blank gap between trials.
    pub isi_ms: u64,
    /// Feedback dwell after a keypress (training only).
    pub feedback_response_ms: u64,
    /// Feedback dwell after a timeout (training only).
    pub feedback_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixation_durations_ms: vec![500, 750, 1000],
            stimulus_window_ms: 2000,
            isi_ms: 500,
            feedback_response_ms: 1200,
            feedback_timeout_ms: 1500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_main_config_is_feasible() {
        let config = SequenceConfig::default();
        for task in [TaskType::Ld, TaskType::Pm] {
            for phase in [BlockPhase::Before, BlockPhase::After] {
                config.validate_main(task, phase).unwrap();
            }
        }
        config.validate_training(TaskType::Pm).unwrap();
    }

    #[test]
    fn oversized_block_is_rejected() {
        let config = SequenceConfig {
            ld_pairs_per_block: 200,
            ..SequenceConfig::default()
        };
        let err = config
            .validate_main(TaskType::Ld, BlockPhase::Before)
            .unwrap_err();
        assert!(matches!(err, SequenceError::PoolExhausted { .. }));
    }

    #[test]
    fn impossible_spacing_is_rejected() {
        let config = SequenceConfig {
            pm_trials_per_block: 16,
            min_ld_between_pm: 20,
            ..SequenceConfig::default()
        };
        let err = config
            .validate_main(TaskType::Pm, BlockPhase::Before)
            .unwrap_err();
        assert!(matches!(
            err,
            SequenceError::InfeasibleSpacing {
                required: 305,
                plain: 160
            }
        ));
    }

    #[test]
    fn spacing_only_binds_pm_blocks() {
        let config = SequenceConfig {
            pm_trials_per_block: 16,
            min_ld_between_pm: 20,
            ..SequenceConfig::default()
        };
        config
            .validate_main(TaskType::Ld, BlockPhase::Before)
            .unwrap();
    }
}
