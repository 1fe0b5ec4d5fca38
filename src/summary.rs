// Status counts over the full collection

use crate::models::{Status, Task};
use serde::{Deserialize, Serialize};

/// Number of tasks in each status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub todo: usize,
    pub doing: usize,
    pub done: usize,
}

impl StatusCounts {
    /// Get the count for one status
    pub fn get(&self, status: Status) -> usize {
        match status {
            Status::Todo => self.todo,
            Status::Doing => self.doing,
            Status::Done => self.done,
        }
    }

    /// Get the count across all statuses
    pub fn total(&self) -> usize {
        self.todo + self.doing + self.done
    }

    fn record(&mut self, status: Status) {
        match status {
            Status::Todo => self.todo += 1,
            Status::Doing => self.doing += 1,
            Status::Done => self.done += 1,
        }
    }
}

/// Count tasks per status in a single pass
pub fn count_by_status<'a, I>(tasks: I) -> StatusCounts
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().fold(StatusCounts::default(), |mut counts, task| {
        counts.record(task.status);
        counts
    })
}
