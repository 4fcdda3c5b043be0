pub mod session;
pub mod stimulus;
pub mod task;
pub mod trial;

pub use session::{BlockSummary, KindSummary, Session};
pub use stimulus::{
    nonword_pool, pm_cues, training_nonwords, training_words, word_pool, PmCue, StimulusKind,
    NONWORD_KEY, WORD_KEY,
};
pub use task::{BlockPhase, TaskType};
pub use trial::{Sequence, Trial, TrialResult};
