//! Task data model
//!
//! A task is pure data plus derived bookkeeping. Only the scheduler mutates
//! `status`, `remaining` and `timeline`; everything handed out is read-only.

use crate::timeline::Timeline;
use serde::{Deserialize, Serialize};
use std::fmt;
use village_types::{BuildingId, Priority, TaskId, TaskKind};

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    /// In the ready queue
    Waiting,
    /// Holding the builder
    Running,
    /// Finished all of its work
    Completed,
    /// Discarded by an ignored disruption; never completes
    Failed,
}

impl TaskStatus {
    /// Returns true for states a task never leaves
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Waiting => write!(f, "Waiting"),
            TaskStatus::Running => write!(f, "Running"),
            TaskStatus::Completed => write!(f, "Completed"),
            TaskStatus::Failed => write!(f, "Failed"),
        }
    }
}

/// Request to add work to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub kind: TaskKind,
    /// Total processing time (burst time), must be positive
    pub cost: u64,
    pub priority: Option<Priority>,
    pub target: Option<BuildingId>,
}

impl TaskRequest {
    /// Creates a request with no priority and no target
    pub fn new(kind: TaskKind, cost: u64) -> Self {
        Self {
            kind,
            cost,
            priority: None,
            target: None,
        }
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the target building
    pub fn with_target(mut self, target: BuildingId) -> Self {
        self.target = Some(target);
        self
    }
}

/// The schedulable unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    cost: u64,
    remaining: u64,
    priority: Option<Priority>,
    target: Option<BuildingId>,
    created_at: u64,
    last_readied_at: u64,
    timeline: Timeline,
    status: TaskStatus,
    completed_at: Option<u64>,
    failed_at: Option<u64>,
}

impl Task {
    pub(crate) fn new(id: TaskId, request: TaskRequest, now: u64) -> Self {
        Self {
            id,
            kind: request.kind,
            cost: request.cost,
            remaining: request.cost,
            priority: request.priority,
            target: request.target,
            created_at: now,
            last_readied_at: now,
            timeline: Timeline::new(),
            status: TaskStatus::Waiting,
            completed_at: None,
            failed_at: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_defense(&self) -> bool {
        self.kind.is_defense()
    }

    /// Total processing time fixed at creation
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Processing time left
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Processing time already spent
    pub fn executed(&self) -> u64 {
        self.cost.saturating_sub(self.remaining)
    }

    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Sort key for the priority policies; smaller runs first
    pub fn priority_rank(&self) -> u16 {
        Priority::rank(self.priority)
    }

    pub fn target(&self) -> Option<BuildingId> {
        self.target
    }

    /// Tick at which the task entered the system
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Tick at which the task last became eligible to run
    pub fn last_readied_at(&self) -> u64 {
        self.last_readied_at
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    pub fn failed_at(&self) -> Option<u64> {
        self.failed_at
    }

    /// Waiting -> Running
    pub(crate) fn start(&mut self, now: u64) {
        debug_assert_eq!(self.status, TaskStatus::Waiting);
        self.status = TaskStatus::Running;
        self.timeline.open(now);
    }

    /// Running -> Waiting
    pub(crate) fn suspend(&mut self, now: u64) {
        debug_assert_eq!(self.status, TaskStatus::Running);
        self.status = TaskStatus::Waiting;
        self.timeline.close(now);
        self.last_readied_at = now;
    }

    /// Consumes one unit of work; returns true when none is left
    pub(crate) fn advance(&mut self) -> bool {
        debug_assert_eq!(self.status, TaskStatus::Running);
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Running -> Completed
    pub(crate) fn complete(&mut self, now: u64) {
        debug_assert_eq!(self.remaining, 0);
        self.status = TaskStatus::Completed;
        self.timeline.close_on_completion(now);
        self.completed_at = Some(now);
    }

    /// Running -> Failed
    pub(crate) fn fail(&mut self, now: u64) {
        self.status = TaskStatus::Failed;
        self.timeline.close(now);
        self.failed_at = Some(now);
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}/{}] {}",
            self.id,
            self.kind,
            self.remaining,
            self.cost,
            self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upgrade(cost: u64) -> Task {
        Task::new(TaskId::FIRST, TaskRequest::new(TaskKind::Upgrade, cost), 0)
    }

    #[test]
    fn test_new_task_is_waiting() {
        let task = upgrade(5);
        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.remaining(), 5);
        assert_eq!(task.last_readied_at(), task.created_at());
        assert!(task.timeline().is_empty());
    }

    #[test]
    fn test_suspend_updates_ready_time_and_closes_segment() {
        let mut task = upgrade(5);
        task.start(0);
        task.advance();
        task.advance();
        task.suspend(2);

        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.last_readied_at(), 2);
        assert_eq!(task.timeline().total_duration(10), task.executed());
    }

    #[test]
    fn test_complete_after_all_work() {
        let mut task = upgrade(2);
        task.start(3);
        assert!(!task.advance());
        assert!(task.advance());
        task.complete(5);

        assert_eq!(task.status(), TaskStatus::Completed);
        assert_eq!(task.completed_at(), Some(5));
        assert_eq!(task.timeline().segments()[0].end, Some(5));
        assert!(task.status().is_terminal());
    }

    #[test]
    fn test_fail_keeps_remaining_work() {
        let mut task = upgrade(4);
        task.start(0);
        task.advance();
        task.fail(1);

        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.remaining(), 3);
        assert_eq!(task.failed_at(), Some(1));
        assert_eq!(task.completed_at(), None);
    }

    #[test]
    fn test_request_builder() {
        let request = TaskRequest::new(TaskKind::Repair, 4)
            .with_priority(Priority::HIGHEST)
            .with_target(BuildingId::from_raw(2));
        assert_eq!(request.priority, Some(Priority::HIGHEST));
        assert_eq!(request.target, Some(BuildingId::from_raw(2)));
    }
}
