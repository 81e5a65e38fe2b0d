//! Normalized timeline for chart rendering
//!
//! All rows share one axis running from the earliest arrival (`origin`) to
//! the latest completion (`horizon`). Positions are ticks relative to the
//! origin plus percentages of the span.

use serde::{Deserialize, Serialize};
use village_types::{TaskId, TaskKind};

/// One merged run segment on the common axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSegment {
    /// Ticks after the origin
    pub start: u64,
    pub end: u64,
    pub start_percent: f64,
    pub width_percent: f64,
}

/// One task's row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub task_id: TaskId,
    pub kind: TaskKind,
    /// Arrival, ticks after the origin
    pub offset: u64,
    pub segments: Vec<ChartSegment>,
}

/// Common-axis timeline over every completed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTimeline {
    pub origin: u64,
    pub horizon: u64,
    /// `horizon - origin`, at least 1
    pub span: u64,
    pub rows: Vec<TimelineRow>,
}

impl NormalizedTimeline {
    pub(crate) fn new(origin: u64, horizon: u64) -> Self {
        Self {
            origin,
            horizon,
            span: horizon.saturating_sub(origin).max(1),
            rows: Vec::new(),
        }
    }

    /// Adds a row from absolute `[start, end)` runs
    pub(crate) fn push_row(
        &mut self,
        task_id: TaskId,
        kind: TaskKind,
        created_at: u64,
        runs: &[(u64, u64)],
    ) {
        let segments = merge_runs(runs, self.origin, self.horizon)
            .into_iter()
            .map(|(start, end)| self.chart_segment(start, end))
            .collect();

        self.rows.push(TimelineRow {
            task_id,
            kind,
            offset: created_at.saturating_sub(self.origin),
            segments,
        });
    }

    fn chart_segment(&self, start: u64, end: u64) -> ChartSegment {
        let start = start - self.origin;
        let end = end - self.origin;
        let span = self.span as f64;
        ChartSegment {
            start,
            end,
            start_percent: start as f64 / span * 100.0,
            width_percent: (end - start) as f64 / span * 100.0,
        }
    }
}

/// Clamps runs to `[origin, horizon]`, drops empty ones and merges touching runs
fn merge_runs(runs: &[(u64, u64)], origin: u64, horizon: u64) -> Vec<(u64, u64)> {
    let mut clamped: Vec<(u64, u64)> = runs
        .iter()
        .map(|&(start, end)| (start.clamp(origin, horizon), end.clamp(origin, horizon)))
        .filter(|(start, end)| end > start)
        .collect();
    clamped.sort_unstable();

    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(clamped.len());
    for (start, end) in clamped {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}
