//! # Simulated Scheduler
//!
//! A discrete-time simulation of a single builder working through a dynamic
//! set of tasks under interchangeable scheduling policies.
//!
//! ## Philosophy
//!
//! - **Determinism first**: Same calls in the same order => same schedule.
//!   Every tie breaks by ascending task id.
//! - **Explicit ticks**: The engine never starts timers. A caller-owned loop or
//!   a test harness calls [`Scheduler::tick`].
//! - **Single writer**: Only the engine mutates task status, remaining work
//!   and timelines. Collaborators enqueue work and set configuration.
//!
//! ## Key Types
//!
//! - [`Scheduler`]: Ready queue, running slot and simulated clock
//! - [`Policy`]: FCFS, SJF, SRTF, Priority (NP/P), Round Robin
//! - [`Task`] and [`Timeline`]: The schedulable unit and its run segments
//! - [`DisruptionOutcome`] / [`DisruptionResolution`]: Disruption handling
//!
//! ## Example
//!
//! ```
//! use sim_scheduler::{Policy, Scheduler, TaskRequest};
//! use village_types::TaskKind;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.set_policy(Policy::Srtf);
//! let task = scheduler.enqueue(TaskRequest::new(TaskKind::Upgrade, 2)).unwrap();
//!
//! scheduler.tick();
//! let report = scheduler.tick();
//! assert_eq!(report.completed, Some(task));
//! ```

pub mod error;
pub mod policy;
pub mod scheduler;
pub mod task;
pub mod test_utils;
pub mod timeline;

pub use error::SchedulerError;
pub use policy::Policy;
pub use scheduler::{
    DisruptionConfig, DisruptionDecision, DisruptionOutcome, DisruptionResolution, FailedTask,
    IgnoreOutcome, PreemptionReason, ScheduleEvent, Scheduler, SchedulerConfig, StateSnapshot,
    TickReport,
};
pub use task::{Task, TaskRequest, TaskStatus};
pub use timeline::{Segment, Timeline};
