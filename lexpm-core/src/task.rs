use serde::{Deserialize, Serialize};

/// Which task a block runs: plain lexical decision, or lexical decision
/// with an embedded prospective-memory component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskType {
    Ld,
    Pm,
}

impl TaskType {
    pub fn has_pm_component(self) -> bool {
        matches!(self, TaskType::Pm)
    }
}

/// Position of a block relative to the interruption manipulation.
/// Each phase draws from its own stimulus pool so no item repeats
/// across phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockPhase {
    Before,
    After,
}
