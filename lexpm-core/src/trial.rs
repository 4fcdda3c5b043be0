use serde::{Deserialize, Serialize};

use crate::stimulus::{PmCue, StimulusKind, NONWORD_KEY, WORD_KEY};
use crate::task::TaskType;

/// A single entry of a generated block. Immutable once the sequence is
/// built; the engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trial {
    pub index: usize,
    pub text: &'static str,
    pub kind: StimulusKind,
    pub expected_key: char,
}

impl Trial {
    pub fn word(text: &'static str) -> Self {
        Self {
            index: 0,
            text,
            kind: StimulusKind::Word,
            expected_key: WORD_KEY,
        }
    }

    pub fn non_word(text: &'static str) -> Self {
        Self {
            index: 0,
            text,
            kind: StimulusKind::NonWord,
            expected_key: NONWORD_KEY,
        }
    }

    pub fn pm_cue(cue: &PmCue) -> Self {
        Self {
            index: 0,
            text: cue.word,
            kind: StimulusKind::PmCue,
            expected_key: cue.key,
        }
    }

    pub fn is_pm_cue(&self) -> bool {
        self.kind == StimulusKind::PmCue
    }
}

/// An ordered block of trials for one task run. Indices are assigned
/// in final presentation order at construction and never change.
#[derive(Debug, Clone)]
pub struct Sequence {
    task: TaskType,
    trials: Vec<Trial>,
}

impl Sequence {
    /// Takes trials in presentation order and stamps 0..n indices.
    pub fn from_trials(task: TaskType, mut trials: Vec<Trial>) -> Self {
        for (i, trial) in trials.iter_mut().enumerate() {
            trial.index = i;
        }
        Self { task, trials }
    }

    pub fn task(&self) -> TaskType {
        self.task
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Trial> {
        self.trials.get(index)
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }
}

/// One recorded outcome per trial, created exactly once on response or
/// on window expiry and never mutated. Field names serialize to the
/// storage columns of the trial table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResult {
    pub session_id: String,
    pub trial_index: usize,
    pub stimulus_text: String,
    pub stimulus_kind: StimulusKind,
    pub expected_key: char,
    pub pressed_key: Option<char>,
    pub correct: bool,
    pub reaction_time_ms: Option<f64>,
    pub responded: bool,
    pub fixation_duration_ms: u64,
    pub captured_at_epoch_ms: u64,
}
