//! Data-integrity warnings
//!
//! Recovered locally and logged. Never surfaced as a failure.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use village_types::TaskId;

/// What was wrong with a task's recorded history
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityIssue {
    /// Completed without any run segment; a one-tick segment was synthesized
    #[error("completed with an empty timeline")]
    EmptyTimeline,

    /// Handed to the reporter without a completion time; skipped
    #[error("reported without a completion time")]
    MissingCompletion,

    /// Turnaround shorter than the cost; waiting floored at zero
    #[error("turnaround {turnaround} is shorter than cost {cost}")]
    WaitingUnderflow { turnaround: u64, cost: u64 },
}

/// Non-fatal inconsistency found while building a report
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{task_id}: {issue}")]
pub struct DataIntegrityWarning {
    pub task_id: TaskId,
    pub issue: IntegrityIssue,
}

impl DataIntegrityWarning {
    pub(crate) fn raise(task_id: TaskId, issue: IntegrityIssue) -> Self {
        let warning = Self { task_id, issue };
        log::warn!("data integrity: {}", warning);
        warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let warning = DataIntegrityWarning {
            task_id: TaskId::from_raw(4),
            issue: IntegrityIssue::WaitingUnderflow {
                turnaround: 2,
                cost: 3,
            },
        };
        assert_eq!(
            warning.to_string(),
            "P4: turnaround 2 is shorter than cost 3"
        );
    }
}
