use serde::{Deserialize, Serialize};

use crate::task::Task;
use crate::time::TimeOfDay;

/// Display state of a task relative to the current time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Done,
    Next,
    Current,
    Previous,
}

impl TaskStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Done => "Done",
            TaskStatus::Next => "Next",
            TaskStatus::Current => "Current",
            TaskStatus::Previous => "Previous",
        }
    }
}

/// Classify `task` at `now`. The result is not cached; callers re-run it as
/// the clock advances.
///
/// Both span endpoints count as `Current`. An overnight span is compared on
/// its normalized form, so shortly after midnight such a task still reads as
/// `Next`.
pub fn classify(task: &Task, now: TimeOfDay) -> TaskStatus {
    if task.done {
        return TaskStatus::Done;
    }
    let (start, end) = task.span().normalized();
    let now = now.minutes();
    if now < start {
        TaskStatus::Next
    } else if now > end {
        TaskStatus::Previous
    } else {
        TaskStatus::Current
    }
}
