//! Disruption Tests
//!
//! Defense work preempting ordinary work, and the cost of ignoring an attack.

use sim_scheduler::test_utils::ScenarioHarness;
use sim_scheduler::{
    DisruptionConfig, DisruptionDecision, DisruptionOutcome, DisruptionResolution, Policy,
    PreemptionReason, ScheduleEvent, Scheduler, SchedulerConfig, SchedulerError, TaskRequest,
    TaskStatus,
};
use tests_scenarios::segments_of;
use village::{BuildingKind, Village, VillageConfig, VillageError};
use village_types::{Priority, TaskKind};

/// Test: Defense preempts SRTF work regardless of remaining time
///
/// A (cost 10) runs until tick 5, when the disruption lands. The next tick
/// belongs to the shorter Defense task; A resumes with the same remaining
/// work once both Defense tasks are done.
#[test]
fn test_defense_preempts_under_srtf() {
    let mut harness = ScenarioHarness::with_policy(Policy::Srtf);
    let a = harness.upgrade(10);
    harness.tick_n(5);

    let DisruptionOutcome::Defended { defense_tasks } = harness.scheduler_mut().inject_disruption()
    else {
        panic!("expected automatic defense under a preemptive policy");
    };
    assert_eq!(defense_tasks.len(), 2);

    let report = harness.tick();
    assert_eq!(report.tick, 5);
    assert_eq!(report.preempted, Some(a));
    let task_a = harness.scheduler().task(a).unwrap();
    assert_eq!(task_a.status(), TaskStatus::Waiting);
    assert_eq!(task_a.remaining(), 5);

    harness.run_until_idle(30);

    // Shorter Defense task first, then the longer one, then A
    let order = harness.completion_order();
    assert_eq!(order, vec![defense_tasks[1], defense_tasks[0], a]);
    let task_a = harness.completed_task(a).unwrap();
    assert_eq!(segments_of(task_a), vec![(0, 5), (10, 15)]);
    assert_eq!(task_a.completed_at(), Some(15));
}

/// Test: Round Robin defends automatically and never slices Defense work
///
/// With a quantum of 2 and Defense tasks of cost 5, each Defense task still
/// runs to completion in one stretch. Afterwards B, readied at tick 0, goes
/// ahead of A, which was readied again when the Defense work took over.
#[test]
fn test_round_robin_defense_ignores_quantum() {
    let scheduler = Scheduler::with_config(SchedulerConfig {
        policy: Policy::RoundRobin,
        quantum_ticks: 2,
        disruption: DisruptionConfig {
            defense_costs: vec![5, 5],
            ..DisruptionConfig::default()
        },
    })
    .unwrap();
    let mut harness = ScenarioHarness::new(scheduler);
    let a = harness.upgrade(6);
    let b = harness.upgrade(6);
    harness.tick();

    let DisruptionOutcome::Defended { defense_tasks } = harness.scheduler_mut().inject_disruption()
    else {
        panic!("expected automatic defense under Round Robin");
    };
    assert_eq!(defense_tasks.len(), 2);
    assert!(!harness.scheduler().pending_disruption());

    harness.tick_n(11);
    let trace = harness.execution_trace();
    let mut expected = vec![Some(a)];
    expected.extend([Some(defense_tasks[0]); 5]);
    expected.extend([Some(defense_tasks[1]); 5]);
    expected.push(Some(b));
    assert_eq!(trace, expected);

    assert_eq!(
        segments_of(harness.completed_task(defense_tasks[0]).unwrap()),
        vec![(1, 6)]
    );
    assert_eq!(
        segments_of(harness.completed_task(defense_tasks[1]).unwrap()),
        vec![(6, 11)]
    );
    assert!(!harness.scheduler().audit_log().iter().any(|event| matches!(
        event,
        ScheduleEvent::TaskPreempted {
            task_id,
            reason: PreemptionReason::QuantumExpired,
            ..
        } if defense_tasks.contains(task_id)
    )));
}

/// Test: A running Defense task is never preempted
#[test]
fn test_defense_holds_builder() {
    let mut harness = ScenarioHarness::with_policy(Policy::PriorityPreemptive);
    harness.upgrade(4);
    harness.tick();
    harness.scheduler_mut().inject_disruption();
    harness.tick();
    let running = harness.scheduler().running_task().unwrap();
    assert!(running.is_defense());
    let defense = running.id();

    harness.enqueue(TaskRequest::new(TaskKind::Upgrade, 1).with_priority(Priority::HIGHEST));
    let report = harness.tick();
    assert_eq!(report.executed, Some(defense));
    assert_eq!(report.preempted, None);
}

/// Test: Non-preemptive policies surface a decision instead
#[test]
fn test_decision_pending_under_fcfs() {
    let mut harness = ScenarioHarness::with_policy(Policy::Fcfs);
    let a = harness.upgrade(6);
    harness.tick_n(2);

    let scheduler = harness.scheduler_mut();
    assert_eq!(scheduler.inject_disruption(), DisruptionOutcome::AwaitingDecision);
    // A second signal folds into the pending one
    assert_eq!(scheduler.inject_disruption(), DisruptionOutcome::AwaitingDecision);
    assert_eq!(scheduler.waiting_count(), 0);

    let resolution = scheduler.resolve_disruption(DisruptionDecision::Defend).unwrap();
    assert!(matches!(resolution, DisruptionResolution::Defended { .. }));
    assert_eq!(
        scheduler.resolve_disruption(DisruptionDecision::Defend),
        Err(SchedulerError::NoPendingDisruption)
    );

    // Defense still takes the builder from A on the next tick
    let report = harness.tick();
    assert_eq!(report.preempted, Some(a));
}

/// Test: Ignoring fails the upgrade, charges once and queues one repair
#[test]
fn test_ignore_path() {
    let mut village = Village::new();
    village.set_policy(Policy::Fcfs);
    let cannon = village.find(BuildingKind::Cannon).unwrap().id;
    let upgrade = village.request_upgrade(cannon, 6, None).unwrap();
    village.tick();
    village.tick();
    let credits_before = village.credits();

    village.inject_disruption();
    village.inject_disruption();
    let DisruptionResolution::Ignored(outcome) = village
        .resolve_disruption(DisruptionDecision::Ignore)
        .unwrap()
    else {
        panic!("expected ignore outcome");
    };
    assert_eq!(
        village.resolve_disruption(DisruptionDecision::Ignore),
        Err(VillageError::Scheduler(SchedulerError::NoPendingDisruption))
    );

    let failed = outcome.failed.unwrap();
    assert_eq!(failed.task_id, upgrade);
    assert_eq!(failed.executed, 2);
    assert_eq!(
        village.credits(),
        credits_before - VillageConfig::default().ignore_penalty
    );

    let repair = outcome.repair_task.unwrap();
    let repair_task = village.scheduler().task(repair).unwrap();
    assert_eq!(repair_task.kind(), TaskKind::Repair);
    assert_eq!(repair_task.target(), Some(cannon));
    assert_eq!(repair_task.priority(), Some(Priority::HIGHEST));

    village.run_until_idle(20);

    let kinds: Vec<_> = village.completed_tasks().iter().map(|t| t.kind()).collect();
    assert_eq!(kinds, vec![TaskKind::Repair]);
    assert!(village
        .completed_tasks()
        .iter()
        .all(|task| task.id() != upgrade));
    assert_eq!(village.failed_tasks()[0].status(), TaskStatus::Failed);

    let report = village.report();
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].task_id, upgrade);
    assert!(report.metrics_for(upgrade).is_none());
}

/// Test: Ignoring with nothing running costs nothing
#[test]
fn test_ignore_while_idle() {
    let mut village = Village::new();
    village.inject_disruption();
    let resolution = village
        .resolve_disruption(DisruptionDecision::Ignore)
        .unwrap();

    assert_eq!(
        resolution,
        DisruptionResolution::Ignored(Default::default())
    );
    assert_eq!(village.credits(), VillageConfig::default().starting_credits);
    assert!(village.scheduler().is_idle());
}
