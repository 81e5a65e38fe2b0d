//! Task classification and priority

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// What a task does for the village
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Raise a building by one level
    Upgrade,
    /// Restore a damaged building
    Repair,
    /// Fend off a disruption; outranks every other kind
    Defense,
}

impl TaskKind {
    /// Returns true for tasks that preempt everything else
    pub fn is_defense(&self) -> bool {
        matches!(self, TaskKind::Defense)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Upgrade => write!(f, "Upgrade"),
            TaskKind::Repair => write!(f, "Repair"),
            TaskKind::Defense => write!(f, "Defense"),
        }
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "upgrade" => Ok(TaskKind::Upgrade),
            "repair" => Ok(TaskKind::Repair),
            "defense" | "defence" => Ok(TaskKind::Defense),
            other => Err(format!("unknown task kind: {}", other)),
        }
    }
}

/// Numeric task priority
///
/// Lower value means higher priority. A task without a priority ranks below
/// every numeric priority; see [`Priority::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Priority(pub u8);

impl Priority {
    /// The most urgent numeric priority
    pub const HIGHEST: Priority = Priority(0);

    /// Sort key for an optional priority; smaller sorts first
    pub fn rank(priority: Option<Priority>) -> u16 {
        match priority {
            Some(Priority(value)) => value as u16,
            None => u16::MAX,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    /// Higher priority compares greater
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.cmp(&self.0)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prio {}", self.0)
    }
}
