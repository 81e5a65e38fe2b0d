//! Disruption injector
//!
//! Turns an external disruption signal into scheduler work. Under a
//! preemptive policy with ordinary work on the builder, Defense tasks are
//! spawned immediately. Otherwise the signal is held until the caller decides
//! to defend or to ignore it.
//!
//! Ignoring while ordinary work runs fails that task and queues a Repair for
//! its target. Credits and building damage are the caller's concern.

use super::{ScheduleEvent, Scheduler};
use crate::error::SchedulerError;
use crate::task::{Task, TaskRequest};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use village_types::{BuildingId, Priority, TaskId, TaskKind};

/// Work synthesized by disruptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisruptionConfig {
    /// Cost of each Defense task spawned when defending
    pub defense_costs: Vec<u64>,
    /// Cost of the Repair task queued after an ignored disruption
    pub repair_cost: u64,
}

impl DisruptionConfig {
    pub(crate) fn validate(&self) -> Result<(), SchedulerError> {
        if self.defense_costs.is_empty() || self.defense_costs.contains(&0) {
            return Err(SchedulerError::InvalidConfig(
                "defense costs must be non-empty and positive".to_string(),
            ));
        }
        if self.repair_cost == 0 {
            return Err(SchedulerError::InvalidConfig(
                "repair cost must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DisruptionConfig {
    fn default() -> Self {
        Self {
            defense_costs: vec![3, 2],
            repair_cost: 4,
        }
    }
}

/// Caller's answer to a pending disruption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisruptionDecision {
    Defend,
    Ignore,
}

impl fmt::Display for DisruptionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisruptionDecision::Defend => write!(f, "defend"),
            DisruptionDecision::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for DisruptionDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "defend" => Ok(DisruptionDecision::Defend),
            "ignore" => Ok(DisruptionDecision::Ignore),
            other => Err(format!("unknown disruption decision: {}", other)),
        }
    }
}

/// Result of raising a disruption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisruptionOutcome {
    /// Defense tasks were queued and will take the builder next tick
    Defended { defense_tasks: Vec<TaskId> },
    /// The caller must resolve with defend or ignore
    AwaitingDecision,
}

/// A task discarded by an ignored disruption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTask {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub target: Option<BuildingId>,
    /// Work done before the failure, now lost
    pub executed: u64,
}

impl From<&Task> for FailedTask {
    fn from(task: &Task) -> Self {
        Self {
            task_id: task.id(),
            kind: task.kind(),
            target: task.target(),
            executed: task.executed(),
        }
    }
}

/// Result of ignoring a disruption
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreOutcome {
    /// Ordinary task that was running, if any
    pub failed: Option<FailedTask>,
    /// Repair queued for the failed task's target
    pub repair_task: Option<TaskId>,
}

/// Result of resolving a pending disruption
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisruptionResolution {
    Defended { defense_tasks: Vec<TaskId> },
    Ignored(IgnoreOutcome),
}

impl Scheduler {
    /// Raises a disruption signal
    ///
    /// Signals raised while a decision is pending fold into that decision.
    pub fn inject_disruption(&mut self) -> DisruptionOutcome {
        if self.pending_disruption {
            return DisruptionOutcome::AwaitingDecision;
        }

        let ordinary_work_running = self.running_task().is_some_and(|task| !task.is_defense());
        if self.config.policy.is_preemptive() && ordinary_work_running {
            self.audit_log.push(ScheduleEvent::DisruptionRaised {
                awaiting_decision: false,
                timestamp_ticks: self.now,
            });
            let defense_tasks = self.spawn_defense();
            info!(
                "disruption at tick {} defended automatically by {:?}",
                self.now, defense_tasks
            );
            return DisruptionOutcome::Defended { defense_tasks };
        }

        self.pending_disruption = true;
        info!("disruption at tick {} awaiting decision", self.now);
        self.audit_log.push(ScheduleEvent::DisruptionRaised {
            awaiting_decision: true,
            timestamp_ticks: self.now,
        });
        DisruptionOutcome::AwaitingDecision
    }

    /// Applies the caller's decision to the pending disruption
    pub fn resolve_disruption(
        &mut self,
        decision: DisruptionDecision,
    ) -> Result<DisruptionResolution, SchedulerError> {
        if !self.pending_disruption {
            return Err(SchedulerError::NoPendingDisruption);
        }
        self.pending_disruption = false;
        self.audit_log.push(ScheduleEvent::DisruptionResolved {
            decision,
            timestamp_ticks: self.now,
        });

        let resolution = match decision {
            DisruptionDecision::Defend => DisruptionResolution::Defended {
                defense_tasks: self.spawn_defense(),
            },
            DisruptionDecision::Ignore => DisruptionResolution::Ignored(self.abandon_running()),
        };
        info!("disruption resolved at tick {}: {:?}", self.now, resolution);
        Ok(resolution)
    }

    fn spawn_defense(&mut self) -> Vec<TaskId> {
        let costs = self.config.disruption.defense_costs.clone();
        costs
            .into_iter()
            .map(|cost| match self.enqueue(TaskRequest::new(TaskKind::Defense, cost)) {
                Ok(task_id) => task_id,
                Err(err) => unreachable!("validated defense cost rejected: {}", err),
            })
            .collect()
    }

    /// Fails the running ordinary task and queues a Repair for its target
    fn abandon_running(&mut self) -> IgnoreOutcome {
        let victim = self.running.filter(|task_id| {
            self.tasks
                .get(task_id)
                .is_some_and(|task| !task.is_defense())
        });
        let Some(task_id) = victim else {
            return IgnoreOutcome::default();
        };

        self.running = None;
        self.ticks_in_quantum = 0;
        let Some(mut task) = self.tasks.remove(&task_id) else {
            return IgnoreOutcome::default();
        };
        task.fail(self.now);
        let failed = FailedTask::from(&task);

        info!("{} failed at tick {} after ignored disruption", task, self.now);
        self.audit_log.push(ScheduleEvent::TaskFailed {
            task_id,
            timestamp_ticks: self.now,
        });
        self.failed.push(task);

        let repair_task = failed.target.and_then(|target| {
            let request = TaskRequest::new(TaskKind::Repair, self.config.disruption.repair_cost)
                .with_priority(Priority::HIGHEST)
                .with_target(target);
            self.enqueue(request).ok()
        });

        IgnoreOutcome {
            failed: Some(failed),
            repair_task,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Policy;
    use crate::scheduler::{PreemptionReason, SchedulerConfig};
    use crate::task::TaskStatus;

    fn scheduler(policy: Policy) -> Scheduler {
        Scheduler::with_config(SchedulerConfig {
            policy,
            ..SchedulerConfig::default()
        })
        .unwrap()
    }

    fn upgrade_on(target: u32, cost: u64) -> TaskRequest {
        TaskRequest::new(TaskKind::Upgrade, cost).with_target(BuildingId::from_raw(target))
    }

    #[test]
    fn test_preemptive_policy_defends_automatically() {
        let mut scheduler = scheduler(Policy::Srtf);
        let upgrade = scheduler.enqueue(upgrade_on(1, 10)).unwrap();
        scheduler.tick();

        let outcome = scheduler.inject_disruption();
        let DisruptionOutcome::Defended { defense_tasks } = outcome else {
            panic!("expected automatic defense, got {:?}", outcome);
        };
        assert_eq!(defense_tasks.len(), 2);
        assert!(!scheduler.pending_disruption());

        let report = scheduler.tick();
        assert_eq!(report.preempted, Some(upgrade));
        assert_eq!(report.executed, Some(defense_tasks[1]));
        assert!(scheduler.audit_log().iter().any(|event| matches!(
            event,
            ScheduleEvent::TaskPreempted {
                reason: PreemptionReason::Disruption,
                ..
            }
        )));
    }

    #[test]
    fn test_one_defense_task_per_configured_cost() {
        let mut scheduler = Scheduler::with_config(SchedulerConfig {
            policy: Policy::Srtf,
            disruption: DisruptionConfig {
                defense_costs: vec![4, 1, 4],
                ..DisruptionConfig::default()
            },
            ..SchedulerConfig::default()
        })
        .unwrap();
        scheduler.enqueue(upgrade_on(1, 10)).unwrap();
        scheduler.tick();

        let DisruptionOutcome::Defended { defense_tasks } = scheduler.inject_disruption() else {
            panic!("expected automatic defense");
        };
        assert_eq!(defense_tasks.len(), 3);
        for (task_id, cost) in defense_tasks.iter().zip([4, 1, 4]) {
            let task = scheduler.task(*task_id).unwrap();
            assert!(task.is_defense());
            assert_eq!(task.cost(), cost);
        }
    }

    #[test]
    fn test_non_preemptive_policy_awaits_decision() {
        let mut scheduler = scheduler(Policy::Fcfs);
        scheduler.enqueue(upgrade_on(1, 10)).unwrap();
        scheduler.tick();

        assert_eq!(
            scheduler.inject_disruption(),
            DisruptionOutcome::AwaitingDecision
        );
        assert!(scheduler.pending_disruption());
        assert_eq!(
            scheduler.inject_disruption(),
            DisruptionOutcome::AwaitingDecision
        );
    }

    #[test]
    fn test_idle_builder_awaits_decision_even_when_preemptive() {
        let mut scheduler = scheduler(Policy::RoundRobin);
        assert_eq!(
            scheduler.inject_disruption(),
            DisruptionOutcome::AwaitingDecision
        );
    }

    #[test]
    fn test_resolve_without_pending_fails() {
        let mut scheduler = Scheduler::new();
        assert_eq!(
            scheduler.resolve_disruption(DisruptionDecision::Defend),
            Err(SchedulerError::NoPendingDisruption)
        );
    }

    #[test]
    fn test_defend_decision_preempts_non_preemptive_work() {
        let mut scheduler = scheduler(Policy::Sjf);
        let upgrade = scheduler.enqueue(upgrade_on(1, 10)).unwrap();
        scheduler.tick();
        scheduler.inject_disruption();

        let resolution = scheduler
            .resolve_disruption(DisruptionDecision::Defend)
            .unwrap();
        let DisruptionResolution::Defended { defense_tasks } = resolution else {
            panic!("expected defense");
        };

        let report = scheduler.tick();
        assert_eq!(report.preempted, Some(upgrade));
        assert!(defense_tasks.contains(&report.executed.unwrap()));
    }

    #[test]
    fn test_ignore_fails_running_task_and_queues_repair() {
        let mut scheduler = scheduler(Policy::Fcfs);
        let upgrade = scheduler.enqueue(upgrade_on(4, 10)).unwrap();
        scheduler.tick();
        scheduler.tick();
        scheduler.inject_disruption();

        let resolution = scheduler
            .resolve_disruption(DisruptionDecision::Ignore)
            .unwrap();
        let DisruptionResolution::Ignored(outcome) = resolution else {
            panic!("expected ignore outcome");
        };

        let failed = outcome.failed.unwrap();
        assert_eq!(failed.task_id, upgrade);
        assert_eq!(failed.executed, 2);
        assert_eq!(failed.target, Some(BuildingId::from_raw(4)));

        let repair_id = outcome.repair_task.unwrap();
        let repair = scheduler.task(repair_id).unwrap();
        assert_eq!(repair.kind(), TaskKind::Repair);
        assert_eq!(repair.priority(), Some(Priority::HIGHEST));
        assert_eq!(repair.target(), Some(BuildingId::from_raw(4)));
        assert_eq!(repair.status(), TaskStatus::Waiting);

        assert_eq!(scheduler.running(), None);
        assert!(scheduler.task(upgrade).is_none());
        let failed_tasks = scheduler.drain_failed();
        assert_eq!(failed_tasks.len(), 1);
        assert_eq!(failed_tasks[0].status(), TaskStatus::Failed);
        assert_eq!(failed_tasks[0].timeline().total_duration(100), 2);
    }

    #[test]
    fn test_ignore_with_idle_builder_changes_nothing() {
        let mut scheduler = Scheduler::new();
        scheduler.inject_disruption();
        let resolution = scheduler
            .resolve_disruption(DisruptionDecision::Ignore)
            .unwrap();
        assert_eq!(
            resolution,
            DisruptionResolution::Ignored(IgnoreOutcome::default())
        );
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_ignore_without_target_queues_no_repair() {
        let mut scheduler = Scheduler::new();
        scheduler
            .enqueue(TaskRequest::new(TaskKind::Upgrade, 5))
            .unwrap();
        scheduler.tick();
        scheduler.inject_disruption();

        let resolution = scheduler
            .resolve_disruption(DisruptionDecision::Ignore)
            .unwrap();
        let DisruptionResolution::Ignored(outcome) = resolution else {
            panic!("expected ignore outcome");
        };
        assert!(outcome.failed.is_some());
        assert_eq!(outcome.repair_task, None);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_running_defense_is_never_preempted() {
        let mut scheduler = scheduler(Policy::Srtf);
        scheduler.enqueue(upgrade_on(1, 10)).unwrap();
        scheduler.tick();
        scheduler.inject_disruption();

        // Smallest Defense task (cost 2) takes the builder first
        let first = scheduler.tick().executed.unwrap();
        assert_eq!(scheduler.task(first).unwrap().remaining(), 1);

        // A running defense surfaces the next disruption as a decision
        assert_eq!(
            scheduler.inject_disruption(),
            DisruptionOutcome::AwaitingDecision
        );
        scheduler
            .resolve_disruption(DisruptionDecision::Defend)
            .unwrap();
        assert_eq!(scheduler.tick().executed, Some(first));
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!("Defend".parse(), Ok(DisruptionDecision::Defend));
        assert_eq!("ignore".parse(), Ok(DisruptionDecision::Ignore));
        assert!("flee".parse::<DisruptionDecision>().is_err());
    }
}
