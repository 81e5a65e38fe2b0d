//! Scenario Test Utilities
//!
//! Shared helpers for the cross-crate scheduling scenarios.
//!
//! ## Test Philosophy
//!
//! - **Invariants every tick**: Scenarios run through [`ScenarioHarness`],
//!   which checks the engine after each tick
//! - **Exact timelines**: Expectations are stated as run segments, not
//!   just completion order
//! - **Replayable**: The same calls always give the same schedule

use sim_scheduler::test_utils::ScenarioHarness;
use sim_scheduler::{DisruptionDecision, Policy, Task, TaskRequest};
use village_types::{Priority, TaskId, TaskKind};

/// Closed run segments of a task as `(start, end)` pairs
pub fn segments_of(task: &Task) -> Vec<(u64, u64)> {
    task.timeline()
        .segments()
        .iter()
        .filter_map(|segment| segment.end.map(|end| (segment.start, end)))
        .collect()
}

/// Enqueues an Upgrade with a priority
pub fn prioritized(harness: &mut ScenarioHarness, cost: u64, priority: u8) -> TaskId {
    harness.enqueue(TaskRequest::new(TaskKind::Upgrade, cost).with_priority(Priority(priority)))
}

/// A fixed mixed workload: staggered arrivals, priorities and a disruption
///
/// Returns the harness after the builder went idle.
pub fn mixed_workload(policy: Policy) -> ScenarioHarness {
    let mut harness = ScenarioHarness::with_policy(policy);
    if let Err(err) = harness.scheduler_mut().set_quantum(3) {
        panic!("quantum rejected: {}", err);
    }

    prioritized(&mut harness, 7, 4);
    prioritized(&mut harness, 3, 2);
    harness.tick_n(2);
    prioritized(&mut harness, 5, 1);
    harness.upgrade(2);
    harness.tick_n(3);

    let scheduler = harness.scheduler_mut();
    scheduler.inject_disruption();
    if scheduler.pending_disruption() {
        if let Err(err) = scheduler.resolve_disruption(DisruptionDecision::Defend) {
            panic!("pending disruption could not be resolved: {}", err);
        }
    }

    harness.tick_n(2);
    prioritized(&mut harness, 1, 0);
    harness.run_until_idle(200);
    harness
}
