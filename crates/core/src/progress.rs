//! Completion percentage for a project's tasks.
//!
//! The percentage is computed either from a loaded task list or from
//! server-tracked counters when the list has not been fetched.

use thiserror::Error;

use crate::model::Task;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("completed count {completed} exceeds task count {total}")]
    CompletedExceedsTotal { total: u32, completed: u32 },
}

/// Task totals for a project. `completed <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskCounts {
    total: u32,
    completed: u32,
}

impl TaskCounts {
    /// Builds counters from raw values, e.g. a server listing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::CompletedExceedsTotal` if `completed > total`.
    pub fn new(total: u32, completed: u32) -> Result<Self, ProgressError> {
        if completed > total {
            return Err(ProgressError::CompletedExceedsTotal { total, completed });
        }
        Ok(Self { total, completed })
    }

    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = saturating_u32(tasks.len());
        let completed = saturating_u32(tasks.iter().filter(|t| t.is_completed()).count());
        Self { total, completed }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn completed(&self) -> u32 {
        self.completed
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.total - self.completed
    }

    /// Completion percentage in `0..=100`, rounded half up. Zero tasks is 0%.
    #[must_use]
    pub fn percent(&self) -> u8 {
        percent(self.completed, self.total)
    }

    pub(crate) fn record_added(&mut self, completed: bool) {
        self.total = self.total.saturating_add(1);
        if completed {
            self.completed = self.completed.saturating_add(1);
        }
    }

    pub(crate) fn record_toggled(&mut self, now_completed: bool) {
        if now_completed {
            self.completed = self.completed.saturating_add(1).min(self.total);
        } else {
            self.completed = self.completed.saturating_sub(1);
        }
    }

    pub(crate) fn record_removed(&mut self, was_completed: bool) {
        self.total = self.total.saturating_sub(1);
        if was_completed {
            self.completed = self.completed.saturating_sub(1);
        }
        self.completed = self.completed.min(self.total);
    }
}

/// Completion percentage of a task list.
#[must_use]
pub fn progress(tasks: &[Task]) -> u8 {
    TaskCounts::from_tasks(tasks).percent()
}

fn percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    // round(100 * c / t) with halves rounded up, without floats
    let rounded = (200 * completed + total) / (2 * total);
    u8::try_from(rounded).unwrap_or(100)
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskId;

    fn task(id: u64, completed: bool) -> Task {
        Task::from_persisted(TaskId::new(id), format!("task {id}"), None, completed).unwrap()
    }

    #[test]
    fn empty_list_is_zero_percent() {
        assert_eq!(progress(&[]), 0);
        assert_eq!(TaskCounts::default().percent(), 0);
    }

    #[test]
    fn one_of_three_rounds_down_to_33() {
        let tasks = [task(1, true), task(2, false), task(3, false)];
        assert_eq!(progress(&tasks), 33);
    }

    #[test]
    fn two_of_three_rounds_up_to_67() {
        let tasks = [task(1, true), task(2, true), task(3, false)];
        assert_eq!(progress(&tasks), 67);
    }

    #[test]
    fn halves_round_up() {
        // 1/8 = 12.5%
        assert_eq!(TaskCounts::new(8, 1).unwrap().percent(), 13);
        // 1/200 = 0.5%
        assert_eq!(TaskCounts::new(200, 1).unwrap().percent(), 1);
    }

    #[test]
    fn bounds() {
        assert_eq!(TaskCounts::new(5, 0).unwrap().percent(), 0);
        assert_eq!(TaskCounts::new(5, 5).unwrap().percent(), 100);
        assert_eq!(TaskCounts::new(u32::MAX, u32::MAX).unwrap().percent(), 100);
    }

    #[test]
    fn matches_float_rounding_for_small_lists() {
        for total in 1..=40u32 {
            for completed in 0..=total {
                let expected = (100.0 * f64::from(completed) / f64::from(total) + 0.5).floor();
                let got = TaskCounts::new(total, completed).unwrap().percent();
                assert_eq!(f64::from(got), expected, "{completed}/{total}");
            }
        }
    }

    #[test]
    fn rejects_completed_over_total() {
        assert_eq!(
            TaskCounts::new(2, 3).unwrap_err(),
            ProgressError::CompletedExceedsTotal {
                total: 2,
                completed: 3
            }
        );
    }

    #[test]
    fn counter_updates_keep_invariant() {
        let mut counts = TaskCounts::new(1, 1).unwrap();
        counts.record_removed(true);
        assert_eq!(counts, TaskCounts::new(0, 0).unwrap());
        counts.record_added(false);
        counts.record_toggled(true);
        counts.record_toggled(true);
        assert_eq!(counts, TaskCounts::new(1, 1).unwrap());
        counts.record_toggled(false);
        assert_eq!(counts.remaining(), 1);
    }
}
