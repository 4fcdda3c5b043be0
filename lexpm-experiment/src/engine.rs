use rand::seq::IndexedRandom;
use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use lexpm_core::{pm_cues, Sequence, StimulusKind, Trial, TrialResult, NONWORD_KEY, WORD_KEY};
use lexpm_timing::Clock;

use crate::config::EngineConfig;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("cannot run an empty sequence")]
    EmptySequence,
    #[error("fixation duration set must not be empty")]
    NoFixationDurations,
    #[error("stimulus window must be positive")]
    ZeroStimulusWindow,
}

/// Correctness verdict and hint text shown during training feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackNote {
    pub correct: bool,
    pub message: String,
}

/// What a host should draw right now.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineView<'a> {
    Ready,
    Fixation,
    Stimulus(&'a Trial),
    Blank,
    Feedback(&'a FeedbackNote),
    Done,
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
enum RunState {
    Ready,
    Fixation {
        deadline_ns: u64,
        fixation_ms: u64,
    },
    Stimulus {
        onset_ns: u64,
        deadline_ns: u64,
        fixation_ms: u64,
    },
    Feedback {
        deadline_ns: u64,
        note: FeedbackNote,
    },
    Isi {
        deadline_ns: u64,
    },
    Done,
    Aborted,
}

enum Expiry {
    FixationOver { fixation_ms: u64 },
    StimulusTimeout { fixation_ms: u64 },
    FeedbackOver,
    IsiOver,
}

/// Drives one task run over a generated sequence: an explicit state
/// machine (Ready -> Fixation -> Stimulus -> [Feedback ->] Isi -> ...
/// -> Done) polled against a monotonic clock, with key events delivered
/// by the host's input adapter.
///
/// Deadlines live inside the current state and are overwritten on every
/// transition, so an expired deadline from a previous state can never
/// fire late; a trial resolves exactly once, to whichever of keypress
/// or timeout the engine processes first.
pub struct TrialEngine<C: Clock, R: Rng> {
    sequence: Sequence,
    config: EngineConfig,
    clock: C,
    rng: R,
    session_id: String,
    training: bool,
    accepted_keys: Vec<char>,
    state: RunState,
    trial_index: usize,
    results: Vec<TrialResult>,
    on_result: Option<Box<dyn FnMut(&TrialResult) + Send>>,
    on_complete: Option<Box<dyn FnOnce(Vec<TrialResult>) + Send>>,
}

impl<C: Clock, R: Rng> TrialEngine<C, R> {
    pub fn new(
        sequence: Sequence,
        config: EngineConfig,
        session_id: impl Into<String>,
        training: bool,
        clock: C,
        rng: R,
    ) -> Result<Self, EngineError> {
        if sequence.is_empty() {
            return Err(EngineError::EmptySequence);
        }
        if config.fixation_durations_ms.is_empty() {
            return Err(EngineError::NoFixationDurations);
        }
        if config.stimulus_window_ms == 0 {
            return Err(EngineError::ZeroStimulusWindow);
        }

        let mut accepted_keys = vec![WORD_KEY, NONWORD_KEY];
        if sequence.task().has_pm_component() {
            accepted_keys.extend(pm_cues().iter().map(|c| c.key));
        }

        let capacity = sequence.len();
        Ok(Self {
            sequence,
            config,
            clock,
            rng,
            session_id: session_id.into(),
            training,
            accepted_keys,
            state: RunState::Ready,
            trial_index: 0,
            results: Vec::with_capacity(capacity),
            on_result: None,
            on_complete: None,
        })
    }

    /// Per-trial observer for live progress display. Not required for
    /// correctness; the full list is still delivered at completion.
    pub fn set_on_result(&mut self, f: impl FnMut(&TrialResult) + Send + 'static) {
        self.on_result = Some(Box::new(f));
    }

    /// Called exactly once with the full ordered result list when the
    /// run reaches Done. Takes ownership of the results; a host that
    /// prefers polling can skip this and use `take_results` instead.
    pub fn set_on_complete(&mut self, f: impl FnOnce(Vec<TrialResult>) + Send + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    /// Begins the run. A no-op on anything but the Ready state.
    pub fn start(&mut self) {
        if !matches!(self.state, RunState::Ready) {
            return;
        }
        info!(
            trials = self.sequence.len(),
            training = self.training,
            "run started"
        );
        self.enter_fixation();
    }

    /// Advances any due deadline. The host calls this from its event
    /// loop; between calls the engine is quiescent, so state mutation
    /// is never concurrent with key handling.
    pub fn poll(&mut self) {
        let now = self.clock.now_ns();
        let expiry = match &self.state {
            RunState::Fixation {
                deadline_ns,
                fixation_ms,
            } if now >= *deadline_ns => Expiry::FixationOver {
                fixation_ms: *fixation_ms,
            },
            RunState::Stimulus {
                deadline_ns,
                fixation_ms,
                ..
            } if now >= *deadline_ns => Expiry::StimulusTimeout {
                fixation_ms: *fixation_ms,
            },
            RunState::Feedback { deadline_ns, .. } if now >= *deadline_ns => Expiry::FeedbackOver,
            RunState::Isi { deadline_ns } if now >= *deadline_ns => Expiry::IsiOver,
            _ => return,
        };

        match expiry {
            Expiry::FixationOver { fixation_ms } => {
                let onset = now;
                self.state = RunState::Stimulus {
                    onset_ns: onset,
                    deadline_ns: onset + self.config.stimulus_window_ms * 1_000_000,
                    fixation_ms,
                };
                debug!(trial = self.trial_index, onset_ns = onset, "stimulus on");
            }
            Expiry::StimulusTimeout { fixation_ms } => {
                let result = self.make_result(None, None, fixation_ms);
                debug!(trial = self.trial_index, "response window expired");
                self.push_result(result);
                if self.training {
                    let note = FeedbackNote {
                        correct: false,
                        message: "Too slow! Try to respond faster.".to_string(),
                    };
                    self.enter_feedback(note, self.config.feedback_timeout_ms, now);
                } else {
                    self.enter_isi(now);
                }
            }
            Expiry::FeedbackOver => self.enter_isi(now),
            Expiry::IsiOver => self.advance_trial(),
        }
    }

    /// Delivers a key event, timestamped by the engine's clock.
    pub fn handle_key(&mut self, key: char) {
        let now = self.clock.now_ns();
        self.handle_key_at(key, now);
    }

    /// Delivers a key event with the host's own monotonic timestamp.
    /// Only the first qualifying key inside a Stimulus window resolves
    /// the trial; everything else is ignored without any state change.
    pub fn handle_key_at(&mut self, key: char, at_ns: u64) {
        let key = key.to_ascii_lowercase();
        if !self.accepted_keys.contains(&key) {
            return;
        }
        let (onset_ns, fixation_ms) = match &self.state {
            RunState::Stimulus {
                onset_ns,
                fixation_ms,
                ..
            } => (*onset_ns, *fixation_ms),
            _ => return,
        };

        let rt_ns = at_ns.saturating_sub(onset_ns);
        let result = self.make_result(Some(key), Some(rt_ns), fixation_ms);
        debug!(
            trial = self.trial_index,
            key = %key,
            correct = result.correct,
            rt_ms = result.reaction_time_ms,
            "response recorded"
        );
        let note = self.training.then(|| self.feedback_for(&result));
        self.push_result(result);

        let now = self.clock.now_ns();
        match note {
            Some(note) => self.enter_feedback(note, self.config.feedback_response_ms, now),
            None => self.enter_isi(now),
        }
    }

    /// Cancels the run: pending deadlines die with the state, partial
    /// results are discarded, and completion is never signalled.
    pub fn abort(&mut self) {
        if matches!(self.state, RunState::Done | RunState::Aborted) {
            return;
        }
        info!(trial = self.trial_index, "run aborted");
        self.state = RunState::Aborted;
        self.results.clear();
        self.on_complete = None;
    }

    pub fn view(&self) -> EngineView<'_> {
        match &self.state {
            RunState::Ready => EngineView::Ready,
            RunState::Fixation { .. } => EngineView::Fixation,
            RunState::Stimulus { .. } => match self.sequence.get(self.trial_index) {
                Some(trial) => EngineView::Stimulus(trial),
                None => EngineView::Blank,
            },
            RunState::Feedback { note, .. } => EngineView::Feedback(note),
            RunState::Isi { .. } => EngineView::Blank,
            RunState::Done => EngineView::Done,
            RunState::Aborted => EngineView::Aborted,
        }
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        match self.state {
            RunState::Ready | RunState::Done | RunState::Aborted => None,
            _ => self.sequence.get(self.trial_index),
        }
    }

    /// (1-based trial number clamped to the block length, block length).
    pub fn progress(&self) -> (usize, usize) {
        let total = self.sequence.len();
        ((self.trial_index + 1).min(total), total)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, RunState::Done)
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self.state, RunState::Aborted)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    /// Hands over the finished batch. Empty unless the run is Done (or
    /// a completion callback already consumed the results).
    pub fn take_results(&mut self) -> Vec<TrialResult> {
        if self.is_done() {
            std::mem::take(&mut self.results)
        } else {
            Vec::new()
        }
    }

    fn enter_fixation(&mut self) {
        let fixation_ms = self
            .config
            .fixation_durations_ms
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(750);
        let now = self.clock.now_ns();
        self.state = RunState::Fixation {
            deadline_ns: now + fixation_ms * 1_000_000,
            fixation_ms,
        };
        debug!(trial = self.trial_index, fixation_ms, "fixation on");
    }

    fn enter_feedback(&mut self, note: FeedbackNote, dwell_ms: u64, now: u64) {
        self.state = RunState::Feedback {
            deadline_ns: now + dwell_ms * 1_000_000,
            note,
        };
    }

    fn enter_isi(&mut self, now: u64) {
        self.state = RunState::Isi {
            deadline_ns: now + self.config.isi_ms * 1_000_000,
        };
    }

    fn advance_trial(&mut self) {
        self.trial_index += 1;
        if self.trial_index >= self.sequence.len() {
            self.finish();
        } else {
            self.enter_fixation();
        }
    }

    fn finish(&mut self) {
        self.state = RunState::Done;
        info!(results = self.results.len(), "run complete");
        if let Some(callback) = self.on_complete.take() {
            callback(std::mem::take(&mut self.results));
        }
    }

    fn make_result(
        &self,
        pressed: Option<char>,
        rt_ns: Option<u64>,
        fixation_ms: u64,
    ) -> TrialResult {
        // Trials are consumed strictly in order, so the index is in
        // bounds whenever a state that produces results is active.
        let trial = &self.sequence.trials()[self.trial_index];
        TrialResult {
            session_id: self.session_id.clone(),
            trial_index: trial.index,
            stimulus_text: trial.text.to_string(),
            stimulus_kind: trial.kind,
            expected_key: trial.expected_key,
            pressed_key: pressed,
            correct: pressed.is_some_and(|k| k == trial.expected_key),
            reaction_time_ms: rt_ns.map(|ns| (ns as f64 / 1_000_000.0).round()),
            responded: pressed.is_some(),
            fixation_duration_ms: fixation_ms,
            captured_at_epoch_ms: self.clock.epoch_ms(),
        }
    }

    fn push_result(&mut self, result: TrialResult) {
        if let Some(observer) = &mut self.on_result {
            observer(&result);
        }
        self.results.push(result);
    }

    fn feedback_for(&self, result: &TrialResult) -> FeedbackNote {
        let message = if result.correct {
            "Correct!".to_string()
        } else {
            match result.stimulus_kind {
                StimulusKind::PmCue => format!(
                    "Incorrect. Press \"{}\" for {}.",
                    result.expected_key.to_ascii_uppercase(),
                    result.stimulus_text
                ),
                StimulusKind::Word => format!(
                    "Incorrect. \"{}\" is a real word.",
                    result.stimulus_text
                ),
                StimulusKind::NonWord => format!(
                    "Incorrect. \"{}\" is a non-word.",
                    result.stimulus_text
                ),
            }
        };
        FeedbackNote {
            correct: result.correct,
            message,
        }
    }
}
