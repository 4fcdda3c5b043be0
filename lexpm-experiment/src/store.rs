use thiserror::Error;

use lexpm_core::{Session, TrialResult};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("unknown session {0}")]
    UnknownSession(String),
}

/// Narrow persistence port for the surrounding application. Invoked
/// only at run boundaries, never inside the trial loop, and always
/// best-effort: a failing store must not invalidate a finished run.
pub trait ResultStore {
    /// Records that a run began.
    fn open_session(&mut self, session: &Session) -> Result<(), StoreError>;

    /// Persists the complete ordered batch for a finished run.
    fn submit_trials(
        &mut self,
        session_id: &str,
        results: &[TrialResult],
    ) -> Result<(), StoreError>;

    /// Marks a run finished.
    fn close_session(
        &mut self,
        session_id: &str,
        completed_at_epoch_ms: u64,
    ) -> Result<(), StoreError>;
}
