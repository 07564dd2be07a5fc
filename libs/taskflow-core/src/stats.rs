//! Derived task statistics and due-date state

use crate::models::{Task, TaskStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use taskflow_common::due_label;

/// Counters over a task collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
}

impl TaskStats {
    /// Compute statistics for `tasks` as of `today`
    #[must_use]
    pub fn compute(tasks: &[Task], today: NaiveDate) -> Self {
        tasks.iter().fold(Self::default(), |mut stats, task| {
            stats.total += 1;
            match task.status {
                TaskStatus::Completed => stats.completed += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Todo => {}
            }
            if is_overdue(task, today) {
                stats.overdue += 1;
            }
            stats
        })
    }

    /// Share of completed tasks, 0.0 for an empty collection
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = self.completed as f64 / self.total as f64;
            rate
        }
    }
}

/// Whether `task` is past due: not completed and due before `today`
#[must_use]
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status != TaskStatus::Completed && task.due_date.is_some_and(|due| due < today)
}

/// Where a task stands relative to its due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DueState {
    Completed,
    Overdue,
    DueToday,
    Upcoming,
    Unscheduled,
}

/// Classify `task` against `today`
#[must_use]
pub fn due_state(task: &Task, today: NaiveDate) -> DueState {
    if task.status == TaskStatus::Completed {
        return DueState::Completed;
    }
    match task.due_date {
        None => DueState::Unscheduled,
        Some(due) if due < today => DueState::Overdue,
        Some(due) if due == today => DueState::DueToday,
        Some(_) => DueState::Upcoming,
    }
}

/// Display label for a task's due date (`Today`, `Tomorrow`, `Oct 21`)
#[must_use]
pub fn due_date_label(task: &Task, today: NaiveDate) -> Option<String> {
    task.due_date.map(|due| due_label(&due, &today))
}
