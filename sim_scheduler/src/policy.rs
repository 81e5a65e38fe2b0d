//! Scheduling policies
//!
//! Each policy is a selection rule applied to the same ready collection at
//! selection time. The queue itself carries no ordering.
//!
//! | Policy | Idle builder | Busy builder |
//! |---|---|---|
//! | FCFS | earliest `created_at` | keep running |
//! | SJF | smallest `cost` | keep running |
//! | SRTF | smallest `remaining` | smallest `remaining`, running included |
//! | Priority (NP) | smallest priority rank | keep running |
//! | Priority (P) | smallest priority rank | smallest rank, running included |
//! | Round Robin | smallest `last_readied_at` | keep running until the quantum expires |
//!
//! Every rule breaks ties by ascending task id.

use crate::error::SchedulerError;
use crate::task::Task;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use village_types::TaskId;

/// Active scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// First come, first served
    Fcfs,
    /// Shortest job first
    Sjf,
    /// Shortest remaining time first
    Srtf,
    /// Non-preemptive priority
    PriorityNonPreemptive,
    /// Preemptive priority
    PriorityPreemptive,
    /// Round robin with a fixed quantum
    RoundRobin,
}

impl Policy {
    pub const ALL: [Policy; 6] = [
        Policy::Fcfs,
        Policy::Sjf,
        Policy::Srtf,
        Policy::PriorityNonPreemptive,
        Policy::PriorityPreemptive,
        Policy::RoundRobin,
    ];

    /// Stable identifier used by configuration and scripts
    pub fn id(&self) -> &'static str {
        match self {
            Policy::Fcfs => "fcfs",
            Policy::Sjf => "sjf",
            Policy::Srtf => "srtf",
            Policy::PriorityNonPreemptive => "priority-np",
            Policy::PriorityPreemptive => "priority-p",
            Policy::RoundRobin => "rr",
        }
    }

    /// Returns true if a non-Defense task may take the builder from another
    pub fn is_preemptive(&self) -> bool {
        matches!(
            self,
            Policy::Srtf | Policy::PriorityPreemptive | Policy::RoundRobin
        )
    }

    /// Returns true if the running task is subject to quantum expiry
    pub fn uses_quantum(&self) -> bool {
        matches!(self, Policy::RoundRobin)
    }

    /// Picks the candidate among non-Defense tasks
    ///
    /// `running` is the task holding the builder, if any. The result is the
    /// running task itself whenever the policy would not switch.
    pub(crate) fn select<'a, I>(&self, running: Option<&'a Task>, waiting: I) -> Option<TaskId>
    where
        I: Iterator<Item = &'a Task>,
    {
        match self {
            Policy::Fcfs | Policy::Sjf | Policy::PriorityNonPreemptive | Policy::RoundRobin
                if running.is_some() =>
            {
                running.map(Task::id)
            }
            Policy::Fcfs => lowest(waiting, |task| task.created_at()),
            Policy::Sjf => lowest(waiting, |task| task.cost()),
            Policy::PriorityNonPreemptive => lowest(waiting, |task| task.priority_rank() as u64),
            Policy::RoundRobin => lowest(waiting, |task| task.last_readied_at()),
            Policy::Srtf => lowest(waiting.chain(running), |task| task.remaining()),
            Policy::PriorityPreemptive => {
                lowest(waiting.chain(running), |task| task.priority_rank() as u64)
            }
        }
    }
}

/// Defense candidate: smallest remaining work, then lowest id
pub(crate) fn defense_candidate<'a, I>(tasks: I) -> Option<TaskId>
where
    I: Iterator<Item = &'a Task>,
{
    lowest(tasks.filter(|task| task.is_defense()), |task| task.remaining())
}

fn lowest<'a, I, K>(tasks: I, key: K) -> Option<TaskId>
where
    I: Iterator<Item = &'a Task>,
    K: Fn(&Task) -> u64,
{
    tasks
        .min_by_key(|task| (key(*task), task.id()))
        .map(Task::id)
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Fcfs => write!(f, "FCFS"),
            Policy::Sjf => write!(f, "SJF"),
            Policy::Srtf => write!(f, "SRTF"),
            Policy::PriorityNonPreemptive => write!(f, "Priority (non-preemptive)"),
            Policy::PriorityPreemptive => write!(f, "Priority (preemptive)"),
            Policy::RoundRobin => write!(f, "Round Robin"),
        }
    }
}

impl FromStr for Policy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        Policy::ALL
            .iter()
            .copied()
            .find(|policy| policy.id() == id)
            .ok_or_else(|| SchedulerError::InvalidConfig(format!("unknown policy: {}", s)))
    }
}
