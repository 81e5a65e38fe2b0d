//! Per-task metrics and the session report

use crate::gantt::NormalizedTimeline;
use crate::integrity::{DataIntegrityWarning, IntegrityIssue};
use serde::{Deserialize, Serialize};
use sim_scheduler::Task;
use std::fmt::Write as _;
use village_types::{BuildingId, SessionId, TaskId, TaskKind};

/// Performance figures for one completed task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetrics {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub target: Option<BuildingId>,
    pub created_at: u64,
    /// Arrival relative to the session origin
    pub arrival: u64,
    /// Burst time
    pub cost: u64,
    pub completed_at: u64,
    /// `turnaround - cost`, floored at 0
    pub waiting: u64,
    /// `completed_at - created_at`
    pub turnaround: u64,
    /// First run start minus `created_at`
    pub response: u64,
}

/// Means over all completed tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub waiting: f64,
    pub turnaround: f64,
    pub response: f64,
}

impl Averages {
    fn over(metrics: &[TaskMetrics]) -> Self {
        if metrics.is_empty() {
            return Self::default();
        }
        let count = metrics.len() as f64;
        let mean = |value: fn(&TaskMetrics) -> u64| {
            metrics.iter().map(value).sum::<u64>() as f64 / count
        };
        Self {
            waiting: mean(|m| m.waiting),
            turnaround: mean(|m| m.turnaround),
            response: mean(|m| m.response),
        }
    }
}

/// A task lost to an ignored disruption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSummary {
    pub task_id: TaskId,
    pub kind: TaskKind,
    pub target: Option<BuildingId>,
    pub created_at: u64,
    pub failed_at: Option<u64>,
    /// Work spent before the failure
    pub executed: u64,
}

/// End-of-session performance breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session: Option<SessionId>,
    pub tasks: Vec<TaskMetrics>,
    pub averages: Averages,
    pub timeline: NormalizedTimeline,
    pub failed: Vec<FailedSummary>,
    pub warnings: Vec<DataIntegrityWarning>,
}

/// Builds the report for a list of completed tasks and failed tasks
///
/// Tasks are reported in the order given. Completed tasks without a
/// completion time are skipped with a warning.
pub fn build_report(completed: &[Task], failed: &[Task]) -> SessionReport {
    let mut warnings = Vec::new();

    let finished: Vec<(&Task, u64)> = completed
        .iter()
        .filter_map(|task| match task.completed_at() {
            Some(completed_at) => Some((task, completed_at)),
            None => {
                warnings.push(DataIntegrityWarning::raise(
                    task.id(),
                    IntegrityIssue::MissingCompletion,
                ));
                None
            }
        })
        .collect();

    let origin = finished
        .iter()
        .map(|(task, _)| task.created_at())
        .min()
        .unwrap_or(0);
    let horizon = finished
        .iter()
        .map(|(_, completed_at)| *completed_at)
        .max()
        .unwrap_or(origin);

    let mut timeline = NormalizedTimeline::new(origin, horizon);
    let mut tasks = Vec::with_capacity(finished.len());

    for (task, completed_at) in finished {
        let runs = resolved_runs(task, completed_at, &mut warnings);
        let turnaround = completed_at.saturating_sub(task.created_at());
        if turnaround < task.cost() {
            warnings.push(DataIntegrityWarning::raise(
                task.id(),
                IntegrityIssue::WaitingUnderflow {
                    turnaround,
                    cost: task.cost(),
                },
            ));
        }
        let first_start = runs.first().map(|(start, _)| *start).unwrap_or(completed_at);

        tasks.push(TaskMetrics {
            task_id: task.id(),
            kind: task.kind(),
            target: task.target(),
            created_at: task.created_at(),
            arrival: task.created_at().saturating_sub(origin),
            cost: task.cost(),
            completed_at,
            waiting: turnaround.saturating_sub(task.cost()),
            turnaround,
            response: first_start.saturating_sub(task.created_at()),
        });
        timeline.push_row(task.id(), task.kind(), task.created_at(), &runs);
    }

    let failed = failed
        .iter()
        .map(|task| FailedSummary {
            task_id: task.id(),
            kind: task.kind(),
            target: task.target(),
            created_at: task.created_at(),
            failed_at: task.failed_at(),
            executed: task.executed(),
        })
        .collect();

    SessionReport {
        session: None,
        averages: Averages::over(&tasks),
        tasks,
        timeline,
        failed,
        warnings,
    }
}

/// Absolute `[start, end)` runs of a completed task
///
/// An empty timeline falls back to the single tick before completion.
fn resolved_runs(
    task: &Task,
    completed_at: u64,
    warnings: &mut Vec<DataIntegrityWarning>,
) -> Vec<(u64, u64)> {
    if task.timeline().is_empty() {
        warnings.push(DataIntegrityWarning::raise(
            task.id(),
            IntegrityIssue::EmptyTimeline,
        ));
        return vec![(completed_at.saturating_sub(1), completed_at)];
    }
    task.timeline()
        .segments()
        .iter()
        .map(|segment| (segment.start, segment.end.unwrap_or(completed_at)))
        .collect()
}

impl SessionReport {
    /// Tags the report with its session
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub fn metrics_for(&self, task_id: TaskId) -> Option<&TaskMetrics> {
        self.tasks.iter().find(|metrics| metrics.task_id == task_id)
    }

    /// Renders the per-task table and the averages as plain text
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<14} {:>8} {:>6} {:>8} {:>11} {:>9}",
            "Process", "Arrival", "Burst", "Waiting", "Turnaround", "Response"
        );
        for metrics in &self.tasks {
            let _ = writeln!(
                out,
                "{:<14} {:>8} {:>6} {:>8} {:>11} {:>9}",
                format!("{}: {}", metrics.task_id, metrics.kind),
                metrics.arrival,
                metrics.cost,
                metrics.waiting,
                metrics.turnaround,
                metrics.response
            );
        }
        let _ = writeln!(
            out,
            "Avg. waiting {:.2} | Avg. turnaround {:.2} | Avg. response {:.2}",
            self.averages.waiting, self.averages.turnaround, self.averages.response
        );
        for failure in &self.failed {
            let _ = writeln!(
                out,
                "{}: {} failed after {} ticks of work",
                failure.task_id, failure.kind, failure.executed
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_scheduler::test_utils::ScenarioHarness;
    use sim_scheduler::{DisruptionDecision, Policy, TaskRequest};

    fn fcfs_session() -> Vec<Task> {
        let mut harness = ScenarioHarness::with_policy(Policy::Fcfs);
        harness.upgrade(3);
        harness.upgrade(2);
        harness.run_until_idle(20);
        harness.take_completed()
    }

    #[test]
    fn test_fcfs_metrics() {
        let report = build_report(&fcfs_session(), &[]);

        let first = &report.tasks[0];
        assert_eq!(first.turnaround, 3);
        assert_eq!(first.waiting, 0);
        assert_eq!(first.response, 0);

        let second = &report.tasks[1];
        assert_eq!(second.turnaround, 5);
        assert_eq!(second.waiting, 3);
        assert_eq!(second.response, 3);

        assert_eq!(report.averages.waiting, 1.5);
        assert_eq!(report.averages.turnaround, 4.0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_waiting_plus_cost_is_turnaround() {
        let mut harness = ScenarioHarness::with_policy(Policy::RoundRobin);
        harness.scheduler_mut().set_quantum(2).unwrap();
        harness.upgrade(5);
        harness.upgrade(3);
        harness.upgrade(4);
        harness.run_until_idle(50);

        let report = build_report(harness.completed(), &[]);
        for metrics in &report.tasks {
            assert_eq!(metrics.waiting + metrics.cost, metrics.turnaround);
        }
    }

    #[test]
    fn test_timeline_axis_and_merging() {
        let mut harness = ScenarioHarness::with_policy(Policy::RoundRobin);
        harness.scheduler_mut().set_quantum(2).unwrap();
        let only = harness.upgrade(5);
        harness.run_until_idle(10);

        let report = build_report(harness.completed(), &[]);
        assert_eq!(report.timeline.origin, 0);
        assert_eq!(report.timeline.horizon, 5);
        let row = &report.timeline.rows[0];
        assert_eq!(row.task_id, only);
        // Back-to-back quantum slices merge into one bar
        assert_eq!(row.segments.len(), 1);
        assert_eq!(row.segments[0].width_percent, 100.0);
    }

    #[test]
    fn test_empty_timeline_falls_back_to_synthetic_segment() {
        let tasks = fcfs_session();
        let mut value = serde_json::to_value(&tasks[1]).unwrap();
        value["timeline"]["segments"] = serde_json::json!([]);
        let damaged: Task = serde_json::from_value(value).unwrap();

        let report = build_report(&[tasks[0].clone(), damaged], &[]);
        assert_eq!(
            report.warnings,
            vec![DataIntegrityWarning {
                task_id: tasks[1].id(),
                issue: IntegrityIssue::EmptyTimeline,
            }]
        );
        let row = &report.timeline.rows[1];
        assert_eq!(row.segments.len(), 1);
        assert_eq!(row.segments[0].start, 4);
        assert_eq!(row.segments[0].end, 5);
        assert_eq!(report.tasks[1].response, 4);
    }

    #[test]
    fn test_failed_tasks_are_listed_separately() {
        let mut harness = ScenarioHarness::with_policy(Policy::Fcfs);
        harness.enqueue(TaskRequest::new(TaskKind::Upgrade, 6));
        harness.tick_n(2);
        let scheduler = harness.scheduler_mut();
        scheduler.inject_disruption();
        scheduler
            .resolve_disruption(DisruptionDecision::Ignore)
            .unwrap();
        let failed = scheduler.drain_failed();

        let report = build_report(&[], &failed);
        assert!(report.tasks.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].executed, 2);
        assert_eq!(report.failed[0].failed_at, Some(2));
        assert_eq!(report.averages, Averages::default());
    }

    #[test]
    fn test_render_table_lists_every_task() {
        let report = build_report(&fcfs_session(), &[]);
        let table = report.render_table();
        assert!(table.starts_with("Process"));
        assert!(table.contains("P1: Upgrade"));
        assert!(table.contains("P2: Upgrade"));
        assert!(table.contains("Avg. waiting 1.50"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = build_report(&fcfs_session(), &[]).with_session(SessionId::new());
        let json = serde_json::to_string(&report).unwrap();
        let decoded: SessionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.tasks, report.tasks);
        assert!(decoded.session.is_some());
    }
}
