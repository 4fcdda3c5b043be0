pub mod config;
pub mod engine;
pub mod sequence;
pub mod store;

pub use config::{EngineConfig, SequenceConfig};
pub use engine::{EngineError, EngineView, FeedbackNote, TrialEngine};
pub use sequence::{generate_main_sequence, generate_training_sequence, SequenceError};
pub use store::{ResultStore, StoreError};
