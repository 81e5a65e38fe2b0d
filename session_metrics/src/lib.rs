//! # Session Metrics
//!
//! Turns the completed tasks of a scheduling session into per-task metrics,
//! averages and a normalized timeline for chart rendering.
//!
//! ## Philosophy
//!
//! - **Pure**: A report is a function of the tasks handed in. No clock, no state.
//! - **Recover, then tell**: Inconsistent history is patched locally and
//!   surfaced as a [`DataIntegrityWarning`], never as a failure.
//! - **Serializable**: Every report type is plain data for the host to print
//!   or hand to a renderer.

pub mod gantt;
pub mod integrity;
pub mod report;

pub use gantt::{ChartSegment, NormalizedTimeline, TimelineRow};
pub use integrity::{DataIntegrityWarning, IntegrityIssue};
pub use report::{build_report, Averages, FailedSummary, SessionReport, TaskMetrics};
