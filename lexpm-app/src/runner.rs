use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use lexpm_core::{pm_cues, TaskType, Trial, TrialResult, NONWORD_KEY, WORD_KEY};
use lexpm_experiment::{EngineView, TrialEngine};
use lexpm_timing::Clock;

/// Stand-in for the keyboard when no participant is present. Plans one
/// response per stimulus onset: usually the expected key after a
/// plausible reaction time, sometimes a wrong key, sometimes nothing
/// (the trial then times out, which the engine treats as a normal
/// outcome).
pub struct SimulatedParticipant {
    qualifying_keys: Vec<char>,
    accuracy: f64,
    lapse_rate: f64,
    rt_range_ms: (u64, u64),
    rng: StdRng,
}

impl SimulatedParticipant {
    pub fn new(task: TaskType, accuracy: f64, lapse_rate: f64, rng: StdRng) -> Self {
        let mut qualifying_keys = vec![WORD_KEY, NONWORD_KEY];
        if task.has_pm_component() {
            qualifying_keys.extend(pm_cues().iter().map(|c| c.key));
        }
        Self {
            qualifying_keys,
            accuracy: accuracy.clamp(0.0, 1.0),
            lapse_rate: lapse_rate.clamp(0.0, 1.0),
            rt_range_ms: (350, 900),
            rng,
        }
    }

    /// Decides what to do with a freshly presented trial: the key to
    /// press and the monotonic time to press it at, or None to lapse.
    fn plan(&mut self, trial: &Trial, onset_ns: u64) -> Option<(u64, char)> {
        if self.rng.random_bool(self.lapse_rate) {
            return None;
        }
        let rt_ms = self.rng.random_range(self.rt_range_ms.0..=self.rt_range_ms.1);
        let key = if self.rng.random_bool(self.accuracy) {
            trial.expected_key
        } else {
            self.wrong_key(trial.expected_key)
        };
        Some((onset_ns + rt_ms * 1_000_000, key))
    }

    fn wrong_key(&mut self, expected: char) -> char {
        let others: Vec<char> = self
            .qualifying_keys
            .iter()
            .copied()
            .filter(|k| *k != expected)
            .collect();
        others[self.rng.random_range(0..others.len())]
    }
}

/// Real-time loop for one block: polls the engine, feeds it the
/// simulated participant's key events, and hands back the finished
/// batch. Returns an empty list if the run was aborted.
pub fn run_block<C: Clock, R: Rng>(
    engine: &mut TrialEngine<C, R>,
    clock: &C,
    participant: &mut SimulatedParticipant,
) -> Vec<TrialResult> {
    engine.start();

    let mut planned: Option<(u64, char)> = None;
    let mut planned_for: Option<usize> = None;

    while !engine.is_done() && !engine.is_aborted() {
        engine.poll();

        let presented = match engine.view() {
            EngineView::Stimulus(trial) => Some(*trial),
            _ => None,
        };
        if let Some(trial) = presented {
            if planned_for != Some(trial.index) {
                planned_for = Some(trial.index);
                planned = participant.plan(&trial, clock.now_ns());
            }
            if let Some((at_ns, key)) = planned {
                if clock.now_ns() >= at_ns {
                    engine.handle_key(key);
                    planned = None;
                }
            }
        }

        clock.sleep(Duration::from_millis(1));
    }

    engine.take_results()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexpm_experiment::{EngineConfig, SequenceConfig};
    use lexpm_timing::ManualClock;
    use rand::SeedableRng;

    #[test]
    fn simulated_block_resolves_every_trial() {
        let config = SequenceConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let sequence = lexpm_experiment::generate_training_sequence(
            TaskType::Pm,
            &config,
            &mut rng,
        )
        .unwrap();
        let total = sequence.len();

        // ManualClock::sleep advances time, so the loop runs without
        // real waiting.
        let clock = ManualClock::new(1_700_000_000_000);
        let mut engine = TrialEngine::new(
            sequence,
            EngineConfig::default(),
            "sim-session",
            true,
            clock.clone(),
            StdRng::seed_from_u64(3),
        )
        .unwrap();
        let mut participant =
            SimulatedParticipant::new(TaskType::Pm, 0.9, 0.1, StdRng::seed_from_u64(4));

        let results = run_block(&mut engine, &clock, &mut participant);
        assert_eq!(results.len(), total);
        let indices: Vec<usize> = results.iter().map(|r| r.trial_index).collect();
        assert_eq!(indices, (0..total).collect::<Vec<_>>());
    }

    #[test]
    fn full_accuracy_participant_answers_everything_correctly() {
        let config = SequenceConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let sequence =
            lexpm_experiment::generate_training_sequence(TaskType::Ld, &config, &mut rng)
                .unwrap();

        let clock = ManualClock::new(0);
        let mut engine = TrialEngine::new(
            sequence,
            EngineConfig::default(),
            "sim-session",
            false,
            clock.clone(),
            StdRng::seed_from_u64(6),
        )
        .unwrap();
        let mut participant =
            SimulatedParticipant::new(TaskType::Ld, 1.0, 0.0, StdRng::seed_from_u64(7));

        let results = run_block(&mut engine, &clock, &mut participant);
        assert!(results.iter().all(|r| r.correct && r.responded));
        assert!(results
            .iter()
            .all(|r| r.reaction_time_ms.is_some_and(|rt| (350.0..=901.0).contains(&rt))));
    }
}
