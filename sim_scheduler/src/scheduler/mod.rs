//! Scheduler engine
//!
//! Owns the ready queue, the running slot and the simulated clock. Every
//! mutation goes through `enqueue`, `tick` and the configuration setters.
//!
//! ## Tick order
//!
//! Each call to [`Scheduler::tick`] runs, in this fixed order:
//!
//! 1. Quantum check (Round Robin only, never for Defense work)
//! 2. Candidate selection over the ready queue plus the running task
//! 3. Preemption decision
//! 4. Dispatch
//! 5. Advance the running task by one unit of work
//!
//! A tick executes the time unit `[now, now + 1)` and then advances the clock,
//! so a task finishing in that unit completes at `now + 1`.

mod disruption;
mod queue;

pub use disruption::{
    DisruptionConfig, DisruptionDecision, DisruptionOutcome, DisruptionResolution, FailedTask,
    IgnoreOutcome,
};

use crate::error::SchedulerError;
use crate::policy::{defense_candidate, Policy};
use crate::task::{Task, TaskRequest};
use log::{debug, info, warn};
use queue::ReadyQueue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use village_types::{TaskId, TaskKind};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Active policy
    pub policy: Policy,
    /// Maximum contiguous run under Round Robin
    pub quantum_ticks: u64,
    /// Work synthesized by disruptions
    pub disruption: DisruptionConfig,
}

impl SchedulerConfig {
    /// Rejects configurations the engine cannot honor
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.quantum_ticks == 0 {
            return Err(SchedulerError::InvalidConfig(
                "quantum must be a positive number of ticks".to_string(),
            ));
        }
        self.disruption.validate()
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: Policy::Fcfs,
            quantum_ticks: 4,
            disruption: DisruptionConfig::default(),
        }
    }
}

/// Reason a running task went back to Waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreemptionReason {
    /// Round Robin quantum expired
    QuantumExpired,
    /// A better candidate under a preemptive policy
    Preempted,
    /// A Defense task took the builder
    Disruption,
}

/// Scheduling event for the audit trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleEvent {
    TaskEnqueued {
        task_id: TaskId,
        kind: TaskKind,
        timestamp_ticks: u64,
    },
    TaskDispatched {
        task_id: TaskId,
        timestamp_ticks: u64,
    },
    TaskPreempted {
        task_id: TaskId,
        reason: PreemptionReason,
        timestamp_ticks: u64,
    },
    TaskCompleted {
        task_id: TaskId,
        timestamp_ticks: u64,
    },
    TaskFailed {
        task_id: TaskId,
        timestamp_ticks: u64,
    },
    PolicyChanged {
        from: Policy,
        to: Policy,
        timestamp_ticks: u64,
    },
    QuantumChanged {
        quantum_ticks: u64,
        timestamp_ticks: u64,
    },
    DisruptionRaised {
        awaiting_decision: bool,
        timestamp_ticks: u64,
    },
    DisruptionResolved {
        decision: DisruptionDecision,
        timestamp_ticks: u64,
    },
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Time unit executed, `[tick, tick + 1)`
    pub tick: u64,
    /// Task that consumed the time unit
    pub executed: Option<TaskId>,
    /// Task holding the builder after the tick
    pub running: Option<TaskId>,
    /// Waiting tasks after the tick, in id order
    pub waiting: Vec<TaskId>,
    /// Task that finished during the tick
    pub completed: Option<TaskId>,
    /// Task that went back to Waiting during the tick
    pub preempted: Option<TaskId>,
}

/// Read-only view of the scheduler for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub now: u64,
    pub policy: Policy,
    pub running: Option<Task>,
    /// Waiting tasks in id order
    pub waiting: Vec<Task>,
}

/// Single-builder scheduling engine
pub struct Scheduler {
    config: SchedulerConfig,
    /// Arena of every Waiting or Running task
    tasks: HashMap<TaskId, Task>,
    ready: ReadyQueue,
    running: Option<TaskId>,
    /// Contiguous ticks the running task has held the builder
    ticks_in_quantum: u64,
    now: u64,
    next_id: TaskId,
    completed: Vec<Task>,
    failed: Vec<Task>,
    pending_disruption: bool,
    audit_log: Vec<ScheduleEvent>,
}

impl Scheduler {
    /// Creates a scheduler with the default configuration
    pub fn new() -> Self {
        Self::build(SchedulerConfig::default())
    }

    /// Creates a scheduler with a custom configuration
    pub fn with_config(config: SchedulerConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SchedulerConfig) -> Self {
        Self {
            config,
            tasks: HashMap::new(),
            ready: ReadyQueue::new(),
            running: None,
            ticks_in_quantum: 0,
            now: 0,
            next_id: TaskId::FIRST,
            completed: Vec::new(),
            failed: Vec::new(),
            pending_disruption: false,
            audit_log: Vec::new(),
        }
    }

    /// Adds a task to the ready queue
    pub fn enqueue(&mut self, request: TaskRequest) -> Result<TaskId, SchedulerError> {
        if request.cost == 0 {
            return Err(SchedulerError::InvalidTask(
                "cost must be at least one tick".to_string(),
            ));
        }

        let task_id = self.next_id;
        self.next_id = task_id.next();

        let kind = request.kind;
        self.tasks.insert(task_id, Task::new(task_id, request, self.now));
        self.ready.insert(task_id);

        debug!("enqueued {} ({}) at tick {}", task_id, kind, self.now);
        self.audit_log.push(ScheduleEvent::TaskEnqueued {
            task_id,
            kind,
            timestamp_ticks: self.now,
        });

        Ok(task_id)
    }

    /// Switches the active policy; the next tick selects under it
    pub fn set_policy(&mut self, policy: Policy) {
        let from = self.config.policy;
        if from == policy {
            return;
        }
        self.config.policy = policy;
        info!("policy changed from {} to {} at tick {}", from, policy, self.now);
        self.audit_log.push(ScheduleEvent::PolicyChanged {
            from,
            to: policy,
            timestamp_ticks: self.now,
        });
    }

    /// Switches the policy by identifier, keeping the current one on error
    pub fn set_policy_id(&mut self, policy_id: &str) -> Result<Policy, SchedulerError> {
        let policy = policy_id.parse::<Policy>().map_err(|err| {
            warn!("rejected policy {:?}: {}", policy_id, err);
            err
        })?;
        self.set_policy(policy);
        Ok(policy)
    }

    /// Sets the Round Robin quantum, keeping the current one on error
    pub fn set_quantum(&mut self, quantum_ticks: u64) -> Result<(), SchedulerError> {
        if quantum_ticks == 0 {
            warn!("rejected quantum of 0 ticks");
            return Err(SchedulerError::InvalidConfig(
                "quantum must be a positive number of ticks".to_string(),
            ));
        }
        self.config.quantum_ticks = quantum_ticks;
        self.audit_log.push(ScheduleEvent::QuantumChanged {
            quantum_ticks,
            timestamp_ticks: self.now,
        });
        Ok(())
    }

    /// Advances the simulation by one time unit
    pub fn tick(&mut self) -> TickReport {
        let tick = self.now;
        let mut preempted = None;

        // 1. Quantum check
        if self.config.policy.uses_quantum() && self.ticks_in_quantum >= self.config.quantum_ticks
        {
            let expired = self
                .running_task()
                .filter(|task| !task.is_defense())
                .map(Task::id);
            if let Some(current) = expired {
                self.preempt_running(PreemptionReason::QuantumExpired);
                preempted = Some(current);
            }
        }

        // 2. Candidate selection
        let candidate = self.select_candidate();

        // 3. Preemption decision
        if let (Some(current), Some(next)) = (self.running, candidate) {
            if current != next && self.may_preempt(current, next) {
                let reason = if self.task(next).is_some_and(Task::is_defense) {
                    PreemptionReason::Disruption
                } else {
                    PreemptionReason::Preempted
                };
                self.preempt_running(reason);
                preempted = Some(current);
            }
        }

        // 4. Dispatch
        if self.running.is_none() {
            if let Some(next) = candidate {
                self.dispatch(next);
            }
        }

        // 5. Advance
        let executed = self.running;
        let mut completed = None;
        let finished = match self.running {
            Some(current) => {
                self.ticks_in_quantum += 1;
                self.task_mut(current).advance()
            }
            None => false,
        };
        self.now += 1;
        if finished {
            completed = self.complete_running();
        }

        TickReport {
            tick,
            executed,
            running: self.running,
            waiting: self.ready.iter().collect(),
            completed,
            preempted,
        }
    }

    /// Ticks until no work is left or `max_ticks` is reached
    ///
    /// Returns the number of ticks executed.
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while !self.is_idle() && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Returns and clears the tasks completed since the last drain
    pub fn drain_completed(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.completed)
    }

    /// Returns and clears the tasks failed since the last drain
    pub fn drain_failed(&mut self) -> Vec<Task> {
        std::mem::take(&mut self.failed)
    }

    /// Returns a snapshot for rendering
    pub fn current_state(&self) -> StateSnapshot {
        StateSnapshot {
            now: self.now,
            policy: self.config.policy,
            running: self.running_task().cloned(),
            waiting: self.waiting_tasks().cloned().collect(),
        }
    }

    /// Returns the simulated clock
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn policy(&self) -> Policy {
        self.config.policy
    }

    pub fn quantum(&self) -> u64 {
        self.config.quantum_ticks
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns a Waiting or Running task
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    /// Returns the id of the task holding the builder
    pub fn running(&self) -> Option<TaskId> {
        self.running
    }

    pub fn running_task(&self) -> Option<&Task> {
        self.running.and_then(|task_id| self.tasks.get(&task_id))
    }

    pub fn waiting_count(&self) -> usize {
        self.ready.len()
    }

    /// Returns true when nothing is running or waiting
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.ready.is_empty()
    }

    /// Returns true while a disruption awaits a decision
    pub fn pending_disruption(&self) -> bool {
        self.pending_disruption
    }

    /// Returns the audit log
    pub fn audit_log(&self) -> &[ScheduleEvent] {
        &self.audit_log
    }

    /// Clears the audit log
    pub fn clear_audit_log(&mut self) {
        self.audit_log.clear();
    }

    fn waiting_tasks(&self) -> impl Iterator<Item = &Task> + '_ {
        self.ready
            .iter()
            .filter_map(move |task_id| self.tasks.get(&task_id))
    }

    fn select_candidate(&self) -> Option<TaskId> {
        let running = self.running_task();
        if let Some(current) = running.filter(|task| task.is_defense()) {
            return Some(current.id());
        }

        if let Some(defense) = defense_candidate(self.waiting_tasks()) {
            return Some(defense);
        }

        self.config.policy.select(running, self.waiting_tasks())
    }

    fn may_preempt(&self, current: TaskId, next: TaskId) -> bool {
        if self.task(current).is_some_and(Task::is_defense) {
            return false;
        }
        if self.task(next).is_some_and(Task::is_defense) {
            return true;
        }
        self.config.policy.is_preemptive()
    }

    fn preempt_running(&mut self, reason: PreemptionReason) {
        if let Some(task_id) = self.running.take() {
            let now = self.now;
            self.task_mut(task_id).suspend(now);
            self.ready.insert(task_id);
            self.ticks_in_quantum = 0;

            debug!("preempted {} at tick {} ({:?})", task_id, now, reason);
            self.audit_log.push(ScheduleEvent::TaskPreempted {
                task_id,
                reason,
                timestamp_ticks: now,
            });
        }
    }

    fn dispatch(&mut self, task_id: TaskId) {
        let now = self.now;
        self.ready.remove(task_id);
        self.task_mut(task_id).start(now);
        self.running = Some(task_id);
        self.ticks_in_quantum = 0;

        debug!("dispatched {} at tick {}", task_id, now);
        self.audit_log.push(ScheduleEvent::TaskDispatched {
            task_id,
            timestamp_ticks: now,
        });
    }

    fn complete_running(&mut self) -> Option<TaskId> {
        let task_id = self.running.take()?;
        let mut task = self.tasks.remove(&task_id)?;
        task.complete(self.now);
        self.ticks_in_quantum = 0;

        info!("completed {} at tick {}", task, self.now);
        self.audit_log.push(ScheduleEvent::TaskCompleted {
            task_id,
            timestamp_ticks: self.now,
        });
        self.completed.push(task);
        Some(task_id)
    }

    fn task_mut(&mut self, task_id: TaskId) -> &mut Task {
        match self.tasks.get_mut(&task_id) {
            Some(task) => task,
            None => unreachable!("{} is scheduled but missing from the task arena", task_id),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
