//! Aggregate counts over a task list.
//!
//! Everything here is a pure function of its inputs. The reference time is
//! always passed in; nothing reads the clock.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub high_priority: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Completed share as a rounded whole percent; 0 for an empty list.
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct PriorityBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Count tasks by status and priority, and those overdue as of `as_of`.
///
/// Overdue compares calendar dates: a task due on `as_of`'s date is not
/// overdue yet.
pub fn compute_stats(tasks: &[Task], as_of: DateTime<Utc>) -> TaskStats {
    let today = as_of.date_naive();
    tasks.iter().fold(TaskStats::default(), |mut stats, task| {
        stats.total += 1;
        match task.status {
            Status::Completed => stats.completed += 1,
            Status::Pending => stats.pending += 1,
            Status::InProgress => stats.in_progress += 1,
        }
        if task.priority == Priority::High {
            stats.high_priority += 1;
        }
        if task.is_overdue(today) {
            stats.overdue += 1;
        }
        stats
    })
}

pub fn priority_breakdown(tasks: &[Task]) -> PriorityBreakdown {
    let mut breakdown = PriorityBreakdown::default();
    for task in tasks {
        match task.priority {
            Priority::Low => breakdown.low += 1,
            Priority::Medium => breakdown.medium += 1,
            Priority::High => breakdown.high += 1,
        }
    }
    breakdown
}
