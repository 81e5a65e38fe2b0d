//! The village economy around one builder

use crate::building::{Building, BuildingKind};
use crate::error::VillageError;
use crate::mission::{self, Mission};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use session_metrics::{build_report, SessionReport};
use sim_scheduler::{
    DisruptionDecision, DisruptionOutcome, DisruptionResolution, Policy, Scheduler,
    SchedulerConfig, Task, TaskRequest, TickReport,
};
use village_types::{BuildingId, Priority, SessionId, TaskId, TaskKind};

/// Economy constants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillageConfig {
    pub starting_credits: u64,
    /// Charged when an upgrade is requested
    pub upgrade_cost: u64,
    /// Granted when an upgrade completes
    pub upgrade_reward: u64,
    /// Charged when an ignored disruption fails a task
    pub ignore_penalty: u64,
}

impl Default for VillageConfig {
    fn default() -> Self {
        Self {
            starting_credits: 200,
            upgrade_cost: 50,
            upgrade_reward: 100,
            ignore_penalty: 100,
        }
    }
}

/// Buildings, credits and missions driven by a [`Scheduler`]
///
/// The village does the resource accounting the engine leaves to its
/// callers. It never touches task state; it only enqueues work and reacts to
/// what the engine reports back.
pub struct Village {
    config: VillageConfig,
    scheduler: Scheduler,
    session: SessionId,
    buildings: Vec<Building>,
    credits: u64,
    missions: Vec<Mission>,
    completed: Vec<Task>,
    failed: Vec<Task>,
}

impl Village {
    /// Preset village with default economy and scheduler settings
    pub fn new() -> Self {
        Self::build(VillageConfig::default(), Scheduler::new())
    }

    pub fn with_config(
        config: VillageConfig,
        scheduler_config: SchedulerConfig,
    ) -> Result<Self, VillageError> {
        let scheduler = Scheduler::with_config(scheduler_config)?;
        Ok(Self::build(config, scheduler))
    }

    fn build(config: VillageConfig, scheduler: Scheduler) -> Self {
        Self {
            credits: config.starting_credits,
            config,
            scheduler,
            session: SessionId::new(),
            buildings: Building::preset(),
            missions: Vec::new(),
            completed: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Requests an upgrade of `building` taking `cost` ticks of work
    ///
    /// Credits are charged only once the engine has accepted the task.
    pub fn request_upgrade(
        &mut self,
        building: BuildingId,
        cost: u64,
        priority: Option<Priority>,
    ) -> Result<TaskId, VillageError> {
        let target = self
            .building(building)
            .ok_or(VillageError::UnknownBuilding(building))?;
        if !target.kind.is_upgradable() {
            return Err(VillageError::NotUpgradable(target.kind));
        }
        if target.damaged {
            return Err(VillageError::BuildingDamaged(target.kind));
        }
        if self.credits < self.config.upgrade_cost {
            return Err(VillageError::InsufficientResources {
                needed: self.config.upgrade_cost,
                available: self.credits,
            });
        }
        let kind = target.kind;

        let mut request = TaskRequest::new(TaskKind::Upgrade, cost).with_target(building);
        if let Some(priority) = priority {
            request = request.with_priority(priority);
        }
        let task_id = self.scheduler.enqueue(request)?;
        self.credits -= self.config.upgrade_cost;

        debug!(
            "queued {} upgrading {} ({} credits left)",
            task_id, kind, self.credits
        );
        Ok(task_id)
    }

    /// Upgrade request by building kind
    pub fn request_upgrade_of(
        &mut self,
        kind: BuildingKind,
        cost: u64,
        priority: Option<Priority>,
    ) -> Result<TaskId, VillageError> {
        let building = self
            .find(kind)
            .map(|building| building.id)
            .ok_or(VillageError::MissingBuilding(kind))?;
        self.request_upgrade(building, cost, priority)
    }

    /// Advances the engine one tick and applies whatever completed
    pub fn tick(&mut self) -> TickReport {
        let report = self.scheduler.tick();
        self.collect_completions();
        report
    }

    /// Ticks until the builder is idle, bounded by `max_ticks`
    pub fn run_until_idle(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while !self.scheduler.is_idle() && ticks < max_ticks {
            self.tick();
            ticks += 1;
        }
        ticks
    }

    pub fn inject_disruption(&mut self) -> DisruptionOutcome {
        self.scheduler.inject_disruption()
    }

    /// Resolves the pending disruption and settles its cost
    ///
    /// An ignore that fails a task damages its target and charges the
    /// penalty once. Credits never go below zero.
    pub fn resolve_disruption(
        &mut self,
        decision: DisruptionDecision,
    ) -> Result<DisruptionResolution, VillageError> {
        let resolution = self.scheduler.resolve_disruption(decision)?;

        if let DisruptionResolution::Ignored(outcome) = &resolution {
            if let Some(failed) = &outcome.failed {
                self.credits = self.credits.saturating_sub(self.config.ignore_penalty);
                info!(
                    "{} lost; charged {} credits ({} left)",
                    failed.task_id, self.config.ignore_penalty, self.credits
                );
                if let Some(building) = failed.target.and_then(|id| self.building_mut(id)) {
                    building.damaged = true;
                    info!("{} damaged", building.kind);
                }
            }
        }
        self.failed.extend(self.scheduler.drain_failed());

        Ok(resolution)
    }

    /// Applies every task completed since the last call
    ///
    /// Returns the ids applied, in completion order.
    pub fn collect_completions(&mut self) -> Vec<TaskId> {
        let finished = self.scheduler.drain_completed();
        let ids = finished.iter().map(Task::id).collect();
        for task in &finished {
            self.apply_completion(task);
        }
        self.completed.extend(finished);
        ids
    }

    fn apply_completion(&mut self, task: &Task) {
        let Some(target) = task.target() else {
            return;
        };
        match task.kind() {
            TaskKind::Upgrade => {
                let Some(building) = self.building_mut(target) else {
                    return;
                };
                building.level += 1;
                let (kind, level) = (building.kind, building.level);
                self.credits = self.credits.saturating_add(self.config.upgrade_reward);
                info!(
                    "{} finished: {} is now Lv. {}, +{} credits",
                    task.id(),
                    kind,
                    level,
                    self.config.upgrade_reward
                );

                if let Some(mission) = self
                    .missions
                    .iter_mut()
                    .find(|mission| mission.building == target && !mission.completed)
                {
                    mission.completed = true;
                    info!("mission complete: {}", mission.description);
                }
            }
            TaskKind::Repair => {
                if let Some(building) = self.building_mut(target) {
                    building.damaged = false;
                    info!("{} repaired by {}", building.kind, task.id());
                }
            }
            TaskKind::Defense => {}
        }
    }

    /// Replaces the mission list; returns how many were created
    pub fn generate_missions(&mut self, count: usize) -> usize {
        self.missions = mission::generate(&self.buildings, count);
        info!("{} new missions generated", self.missions.len());
        self.missions.len()
    }

    pub fn all_missions_complete(&self) -> bool {
        !self.missions.is_empty() && self.missions.iter().all(|mission| mission.completed)
    }

    /// Report over every task collected so far
    pub fn report(&self) -> SessionReport {
        build_report(&self.completed, &self.failed).with_session(self.session)
    }

    pub fn set_policy(&mut self, policy: Policy) {
        self.scheduler.set_policy(policy);
    }

    pub fn set_policy_id(&mut self, policy_id: &str) -> Result<Policy, VillageError> {
        Ok(self.scheduler.set_policy_id(policy_id)?)
    }

    pub fn set_quantum(&mut self, quantum_ticks: u64) -> Result<(), VillageError> {
        Ok(self.scheduler.set_quantum(quantum_ticks)?)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &VillageConfig {
        &self.config
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.iter().find(|building| building.id == id)
    }

    /// First building of the given kind
    pub fn find(&self, kind: BuildingKind) -> Option<&Building> {
        self.buildings.iter().find(|building| building.kind == kind)
    }

    fn building_mut(&mut self, id: BuildingId) -> Option<&mut Building> {
        self.buildings.iter_mut().find(|building| building.id == id)
    }

    pub fn missions(&self) -> &[Mission] {
        &self.missions
    }

    /// Tasks completed and applied so far
    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed
    }

    /// Tasks lost to ignored disruptions
    pub fn failed_tasks(&self) -> &[Task] {
        &self.failed
    }
}

impl Default for Village {
    fn default() -> Self {
        Self::new()
    }
}
