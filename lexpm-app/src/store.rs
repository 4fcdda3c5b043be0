use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use lexpm_core::{Session, TrialResult};
use lexpm_experiment::{ResultStore, StoreError};

/// One JSON file per session, holding the session record and its trial
/// batch. The shape matches the two persisted record types the REST
/// backend stores.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    session: Session,
    trials: Vec<TrialResult>,
}

/// File-backed `ResultStore` for the headless runner.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    fn load(&self, session_id: &str) -> Result<SessionFile, StoreError> {
        let path = self.path(session_id);
        if !path.exists() {
            return Err(StoreError::UnknownSession(session_id.to_string()));
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, session_id: &str, file: &SessionFile) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(file)?;
        fs::write(self.path(session_id), serialized)?;
        Ok(())
    }
}

impl ResultStore for JsonFileStore {
    fn open_session(&mut self, session: &Session) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        self.save(
            &session.id,
            &SessionFile {
                session: session.clone(),
                trials: Vec::new(),
            },
        )
    }

    fn submit_trials(
        &mut self,
        session_id: &str,
        results: &[TrialResult],
    ) -> Result<(), StoreError> {
        let mut file = self.load(session_id)?;
        file.trials = results.to_vec();
        self.save(session_id, &file)
    }

    fn close_session(
        &mut self,
        session_id: &str,
        completed_at_epoch_ms: u64,
    ) -> Result<(), StoreError> {
        let mut file = self.load(session_id)?;
        file.session.completed_at_epoch_ms = Some(completed_at_epoch_ms);
        self.save(session_id, &file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexpm_core::{BlockPhase, StimulusKind, TaskType};

    fn temp_store(tag: &str) -> (JsonFileStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("lexpm-store-{tag}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        (JsonFileStore::new(dir.clone()), dir)
    }

    fn session() -> Session {
        Session {
            id: "abc123".into(),
            participant_id: "p-1".into(),
            task_type: TaskType::Pm,
            phase: BlockPhase::Before,
            started_at_epoch_ms: 1_700_000_000_000,
            completed_at_epoch_ms: None,
        }
    }

    #[test]
    fn open_submit_close_round_trips() {
        let (mut store, dir) = temp_store("roundtrip");
        let session = session();
        store.open_session(&session).unwrap();

        let results = vec![TrialResult {
            session_id: session.id.clone(),
            trial_index: 0,
            stimulus_text: "KITCHEN".into(),
            stimulus_kind: StimulusKind::Word,
            expected_key: 'n',
            pressed_key: Some('n'),
            correct: true,
            reaction_time_ms: Some(512.0),
            responded: true,
            fixation_duration_ms: 750,
            captured_at_epoch_ms: 1_700_000_001_000,
        }];
        store.submit_trials(&session.id, &results).unwrap();
        store
            .close_session(&session.id, 1_700_000_002_000)
            .unwrap();

        let raw = fs::read_to_string(dir.join("abc123.json")).unwrap();
        let file: SessionFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(file.session.completed_at_epoch_ms, Some(1_700_000_002_000));
        assert_eq!(file.trials, results);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn submitting_to_a_missing_session_is_an_error() {
        let (mut store, dir) = temp_store("missing");
        let err = store.submit_trials("nope", &[]).unwrap_err();
        assert!(matches!(err, StoreError::UnknownSession(_)));
        let _ = fs::remove_dir_all(&dir);
    }
}
