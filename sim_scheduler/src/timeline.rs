//! Execution timeline
//!
//! Append-only record of the contiguous run segments of one task. At most one
//! segment is open (no `end`) at a time, and only while the task is Running.

use serde::{Deserialize, Serialize};

/// One contiguous run of a task, `[start, end)` in simulated ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: u64,
    /// Unset while the segment is in progress
    pub end: Option<u64>,
}

impl Segment {
    /// Returns true while the segment is still running
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Length of the segment, measuring an open segment up to `now`
    pub fn duration(&self, now: u64) -> u64 {
        self.end.unwrap_or(now).saturating_sub(self.start)
    }
}

/// Ordered run segments of a task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    /// Creates an empty timeline
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Opens a segment at `now`, or continues the most recent one if it has no end
    ///
    /// Returns true if a new segment was opened.
    pub fn open(&mut self, now: u64) -> bool {
        if self.segments.last().is_some_and(Segment::is_open) {
            return false;
        }
        self.segments.push(Segment {
            start: now,
            end: None,
        });
        true
    }

    /// Closes the open segment at `end`, never earlier than its start
    ///
    /// Returns false if no segment was open.
    pub fn close(&mut self, end: u64) -> bool {
        match self.segments.last_mut() {
            Some(segment) if segment.is_open() => {
                segment.end = Some(end.max(segment.start));
                true
            }
            _ => false,
        }
    }

    /// Closes the open segment on completion; a completed segment spans at least one tick
    pub(crate) fn close_on_completion(&mut self, now: u64) -> bool {
        match self.segments.last_mut() {
            Some(segment) if segment.is_open() => {
                segment.end = Some(now.max(segment.start + 1));
                true
            }
            _ => false,
        }
    }

    /// Returns all segments in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the first segment, if the task ever ran
    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// Returns true if a segment is in progress
    pub fn has_open_segment(&self) -> bool {
        self.segments.last().is_some_and(Segment::is_open)
    }

    /// Returns true if no segment was ever recorded
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total executed time, counting an open segment up to `now`
    pub fn total_duration(&self, now: u64) -> u64 {
        self.segments.iter().map(|s| s.duration(now)).sum()
    }

    /// Length of the open segment up to `now`, zero if none is open
    pub fn current_run(&self, now: u64) -> u64 {
        match self.segments.last() {
            Some(segment) if segment.is_open() => segment.duration(now),
            _ => 0,
        }
    }

    /// Checks that segments are ordered, non-overlapping and that only the last may be open
    pub fn is_well_formed(&self) -> bool {
        let mut previous_end = 0;
        let count = self.segments.len();
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.start < previous_end {
                return false;
            }
            match segment.end {
                Some(end) => {
                    if end < segment.start {
                        return false;
                    }
                    previous_end = end;
                }
                None if index + 1 != count => return false,
                None => {}
            }
        }
        true
    }
}
