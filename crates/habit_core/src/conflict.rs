//! Acceptance checks for a new or edited task.
//!
//! Checks run in a fixed order and the first failure is reported, so the
//! most fundamental problem with a draft surfaces first.

use thiserror::Error;
use tracing::debug;

use crate::span::Span;
use crate::task::{Day, SleepWindow, Task, TaskDraft, TaskId};

/// The task a draft collides with, captured for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictingTask {
    pub id: TaskId,
    pub title: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictReason {
    #[error("task name required")]
    EmptyTitle,
    #[error("task name `{0}` is already in use")]
    DuplicateTitle(String),
    #[error("select start and end time")]
    MissingTime,
    #[error("select at least one day")]
    NoDaysSelected,
    #[error("start and end time cannot be the same")]
    DegenerateRange,
    #[error("task overlaps sleep time {}", .window.span().format_12h())]
    SleepConflict { window: SleepWindow },
    #[error("task conflicts on {day} with `{}` ({})", .other.title, .other.span.format_12h())]
    TaskConflict { day: Day, other: ConflictingTask },
}

/// Decide whether `candidate` may be saved next to `existing` tasks.
///
/// The draft's own id is excluded from the title and overlap checks so edits
/// never conflict with the task they replace. On success the accepted task is
/// returned with `done` cleared.
pub fn validate(
    candidate: &TaskDraft,
    existing: &[Task],
    sleep: Option<&SleepWindow>,
) -> Result<Task, ConflictReason> {
    let title = candidate.title.trim();
    if title.is_empty() {
        return Err(ConflictReason::EmptyTitle);
    }

    let others = move || existing.iter().filter(move |task| task.id != candidate.id);

    if others().any(|task| task.title == candidate.title) {
        return Err(ConflictReason::DuplicateTitle(candidate.title.clone()));
    }

    let (Some(start), Some(end)) = (candidate.start, candidate.end) else {
        return Err(ConflictReason::MissingTime);
    };

    if candidate.days.is_empty() {
        return Err(ConflictReason::NoDaysSelected);
    }

    let span = Span::new(start, end);
    if span.is_degenerate() {
        return Err(ConflictReason::DegenerateRange);
    }

    if let Some(window) = sleep {
        if span.overlaps(&window.span()) {
            debug!(%start, %end, "draft overlaps sleep window");
            return Err(ConflictReason::SleepConflict { window: *window });
        }
    }

    for day in candidate.days.iter() {
        let clash = others().find(|task| task.recurs_on(day) && span.overlaps(&task.span()));
        if let Some(other) = clash {
            debug!(%day, other = %other.id, "draft overlaps existing task");
            return Err(ConflictReason::TaskConflict {
                day,
                other: ConflictingTask {
                    id: other.id.clone(),
                    title: other.title.clone(),
                    span: other.span(),
                },
            });
        }
    }

    Ok(Task {
        id: candidate.id.clone(),
        title: candidate.title.clone(),
        start,
        end,
        days: candidate.days.clone(),
        done: false,
    })
}
