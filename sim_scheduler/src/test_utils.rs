//! Test utilities for scheduling scenarios
//!
//! [`ScenarioHarness`] drives a scheduler tick by tick, records every
//! [`TickReport`] and checks the engine invariants after each tick.

use crate::policy::Policy;
use crate::scheduler::{Scheduler, SchedulerConfig, TickReport};
use crate::task::{Task, TaskRequest, TaskStatus};
use std::collections::HashSet;
use village_types::{TaskId, TaskKind};

/// Checks the invariants that must hold between any two ticks
///
/// - the running slot holds a Running task and nothing else is Running
/// - no task is both waiting and running, and none is listed twice
/// - every timeline is well formed and covers exactly the executed work
pub fn check_invariants(scheduler: &Scheduler) -> Result<(), String> {
    let now = scheduler.now();
    let state = scheduler.current_state();

    if let Some(running) = &state.running {
        if running.status() != TaskStatus::Running {
            return Err(format!("{} holds the builder but is {}", running.id(), running.status()));
        }
    }

    let mut seen = HashSet::new();
    for task in state.running.iter().chain(state.waiting.iter()) {
        if !seen.insert(task.id()) {
            return Err(format!("{} appears more than once", task.id()));
        }
        check_task(task, now)?;
    }

    for task in &state.waiting {
        if task.status() != TaskStatus::Waiting {
            return Err(format!("{} is queued but {}", task.id(), task.status()));
        }
    }

    Ok(())
}

fn check_task(task: &Task, now: u64) -> Result<(), String> {
    if task.remaining() > task.cost() {
        return Err(format!("{} has more work left than it cost", task.id()));
    }
    if !task.timeline().is_well_formed() {
        return Err(format!("{} has a malformed timeline", task.id()));
    }
    let covered = task.timeline().total_duration(now);
    if covered != task.executed() {
        return Err(format!(
            "{} timeline covers {} ticks but executed {}",
            task.id(),
            covered,
            task.executed()
        ));
    }
    Ok(())
}

/// Tick-by-tick driver with invariant checking
pub struct ScenarioHarness {
    scheduler: Scheduler,
    reports: Vec<TickReport>,
    finished: Vec<Task>,
}

impl ScenarioHarness {
    /// Creates a harness around a default scheduler with the given policy
    pub fn with_policy(policy: Policy) -> Self {
        let config = SchedulerConfig {
            policy,
            ..SchedulerConfig::default()
        };
        match Scheduler::with_config(config) {
            Ok(scheduler) => Self::new(scheduler),
            Err(err) => panic!("default scheduler config rejected: {}", err),
        }
    }

    /// Creates a harness around an existing scheduler
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            reports: Vec::new(),
            finished: Vec::new(),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Enqueues an Upgrade task of the given cost
    pub fn upgrade(&mut self, cost: u64) -> TaskId {
        self.enqueue(TaskRequest::new(TaskKind::Upgrade, cost))
    }

    /// Enqueues a task, panicking on rejection
    pub fn enqueue(&mut self, request: TaskRequest) -> TaskId {
        match self.scheduler.enqueue(request) {
            Ok(task_id) => task_id,
            Err(err) => panic!("enqueue rejected: {}", err),
        }
    }

    /// Runs one tick and verifies the invariants afterwards
    pub fn tick(&mut self) -> TickReport {
        let report = self.scheduler.tick();
        if let Err(violation) = check_invariants(&self.scheduler) {
            panic!("invariant violated after tick {}: {}", report.tick, violation);
        }
        self.finished.extend(self.scheduler.drain_completed());
        self.reports.push(report.clone());
        report
    }

    /// Runs `count` ticks
    pub fn tick_n(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Ticks until idle, bounded by `max_ticks`; returns ticks executed
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while !self.scheduler.is_idle() && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Every report recorded so far
    pub fn reports(&self) -> &[TickReport] {
        &self.reports
    }

    /// Which task consumed each tick
    pub fn execution_trace(&self) -> Vec<Option<TaskId>> {
        self.reports.iter().map(|report| report.executed).collect()
    }

    /// Ids in the order they completed
    pub fn completion_order(&self) -> Vec<TaskId> {
        self.finished.iter().map(Task::id).collect()
    }

    /// Completed tasks collected from the scheduler
    pub fn completed(&self) -> &[Task] {
        &self.finished
    }

    /// Completed task by id
    pub fn completed_task(&self, task_id: TaskId) -> Option<&Task> {
        self.finished.iter().find(|task| task.id() == task_id)
    }

    /// Hands the completed tasks over, leaving the harness empty
    pub fn take_completed(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.finished)
    }
}
