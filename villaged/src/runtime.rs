//! # Host Runtime
//!
//! Drives a village session from a script and renders what happened.

use crate::script::{ScriptCommand, ScriptError, SessionScript};
use log::{info, warn, LevelFilter};
use sim_scheduler::{
    DisruptionDecision, DisruptionOutcome, DisruptionResolution, Policy, SchedulerConfig,
    TickReport,
};
use std::io::{self, Write};
use thiserror::Error;
use village::{Village, VillageConfig, VillageError};
use village_types::TaskId;

/// Session played when no script is given
pub const DEFAULT_SCRIPT: &str = include_str!("../demos/siege.vgs");

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Village error: {0}")]
    Village(#[from] VillageError),

    #[error("Report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

/// Host runtime configuration
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Script text; the bundled demo when absent
    pub script: Option<String>,
    /// Initial policy
    pub policy: Policy,
    /// Initial Round Robin quantum
    pub quantum_ticks: u64,
    /// Tick budget for the whole session
    pub max_ticks: u64,
    /// Emit the final report as JSON instead of a table
    pub json: bool,
    /// Log level for the stderr sink
    pub log_level: LevelFilter,
    /// Economy constants
    pub village: VillageConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            script: None,
            policy: Policy::Fcfs,
            quantum_ticks: 4,
            max_ticks: 1000,
            json: false,
            log_level: LevelFilter::Warn,
            village: VillageConfig::default(),
        }
    }
}

/// Host runtime
pub struct HostRuntime {
    config: HostConfig,
    village: Village,
    script: SessionScript,
    /// Ticks executed so far
    ticks: u64,
}

impl HostRuntime {
    /// Creates a runtime, parsing the script and validating the scheduler settings
    pub fn new(config: HostConfig) -> Result<Self, HostError> {
        let script = SessionScript::from_text(config.script.as_deref().unwrap_or(DEFAULT_SCRIPT))?;
        let scheduler_config = SchedulerConfig {
            policy: config.policy,
            quantum_ticks: config.quantum_ticks,
            ..SchedulerConfig::default()
        };
        let village = Village::with_config(config.village, scheduler_config)?;

        Ok(Self {
            config,
            village,
            script,
            ticks: 0,
        })
    }

    /// Plays the script, then writes the final report
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), HostError> {
        let commands = self.script.commands().to_vec();
        for (line, command) in commands {
            self.execute(line, command, out)?;
        }

        if self.village.all_missions_complete() {
            writeln!(out, "All missions complete!")?;
        }
        let report = self.village.report();
        if self.config.json {
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        } else {
            write!(out, "{}", report.render_table())?;
        }
        Ok(())
    }

    /// Executes one command
    ///
    /// Requests the village turns down are logged and the session goes on;
    /// only output failures abort.
    pub fn execute<W: Write>(
        &mut self,
        line: usize,
        command: ScriptCommand,
        out: &mut W,
    ) -> Result<(), HostError> {
        match command {
            ScriptCommand::Policy(policy) => {
                self.village.set_policy(policy);
                writeln!(out, "policy {}", policy)?;
            }
            ScriptCommand::Quantum(quantum) => {
                if let Err(err) = self.village.set_quantum(quantum) {
                    rejected(line, &err);
                }
            }
            ScriptCommand::Missions(count) => {
                let created = self.village.generate_missions(count);
                writeln!(out, "{} new missions generated", created)?;
                for mission in self.village.missions() {
                    writeln!(out, "  {}", mission)?;
                }
            }
            ScriptCommand::Upgrade {
                building,
                cost,
                priority,
            } => match self.village.request_upgrade_of(building, cost, priority) {
                Ok(task_id) => writeln!(
                    out,
                    "queued {}: upgrade {} ({} credits left)",
                    task_id,
                    building,
                    self.village.credits()
                )?,
                Err(err) => rejected(line, &err),
            },
            ScriptCommand::Tick(count) => {
                for _ in 0..count {
                    if !self.tick(out)? {
                        break;
                    }
                }
            }
            ScriptCommand::Run => {
                while !self.village.scheduler().is_idle() {
                    if !self.tick(out)? {
                        break;
                    }
                }
            }
            ScriptCommand::Attack => match self.village.inject_disruption() {
                DisruptionOutcome::Defended { defense_tasks } => writeln!(
                    out,
                    "attack! defended automatically by {}",
                    id_list(&defense_tasks)
                )?,
                DisruptionOutcome::AwaitingDecision => {
                    writeln!(out, "attack! defend or ignore?")?
                }
            },
            ScriptCommand::Resolve(decision) => self.resolve(line, decision, out)?,
            ScriptCommand::Status => self.write_status(out)?,
        }
        Ok(())
    }

    /// Runs one tick within the budget; false once the budget is spent
    fn tick<W: Write>(&mut self, out: &mut W) -> Result<bool, HostError> {
        if self.ticks >= self.config.max_ticks {
            warn!("tick budget of {} exhausted", self.config.max_ticks);
            return Ok(false);
        }
        let report = self.village.tick();
        self.ticks += 1;
        writeln!(out, "{}", render_tick(&report))?;
        Ok(true)
    }

    fn resolve<W: Write>(
        &mut self,
        line: usize,
        decision: DisruptionDecision,
        out: &mut W,
    ) -> Result<(), HostError> {
        match self.village.resolve_disruption(decision) {
            Ok(DisruptionResolution::Defended { defense_tasks }) => {
                writeln!(out, "defending with {}", id_list(&defense_tasks))?;
            }
            Ok(DisruptionResolution::Ignored(outcome)) => match outcome.failed {
                Some(failed) => writeln!(
                    out,
                    "ignored: {} lost after {} ticks, {} credits left",
                    failed.task_id,
                    failed.executed,
                    self.village.credits()
                )?,
                None => writeln!(out, "ignored: nothing lost")?,
            },
            Err(err) => rejected(line, &err),
        }
        Ok(())
    }

    fn write_status<W: Write>(&self, out: &mut W) -> Result<(), HostError> {
        let scheduler = self.village.scheduler();
        writeln!(
            out,
            "status at tick {}: {} credits, policy {}",
            scheduler.now(),
            self.village.credits(),
            scheduler.policy()
        )?;
        for building in self.village.buildings() {
            writeln!(out, "  {}", building)?;
        }
        for mission in self.village.missions() {
            writeln!(out, "  {}", mission)?;
        }
        Ok(())
    }

    pub fn village(&self) -> &Village {
        &self.village
    }

    /// Ticks executed so far
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }
}

fn rejected(line: usize, err: &VillageError) {
    info!("line {}: {}", line, err);
}

/// One-line snapshot of a tick
pub fn render_tick(report: &TickReport) -> String {
    let running = report
        .running
        .map(|task_id| task_id.to_string())
        .unwrap_or_else(|| "idle".to_string());
    let mut line = format!(
        "tick {:>4} | running {:<5} | waiting [{}]",
        report.tick,
        running,
        id_list(&report.waiting)
    );
    if let Some(task_id) = report.preempted {
        line.push_str(&format!(" | preempted {}", task_id));
    }
    if let Some(task_id) = report.completed {
        line.push_str(&format!(" | done {}", task_id));
    }
    line
}

fn id_list(ids: &[TaskId]) -> String {
    ids.iter()
        .map(TaskId::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
