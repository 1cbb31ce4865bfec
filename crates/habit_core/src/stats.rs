use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::{Day, Task, TaskId};

/// How far back the streak scan looks.
pub const STREAK_LOOKBACK_DAYS: u32 = 365;

/// One done/undone toggle. `date` is the local wall-clock time of the toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub task_id: TaskId,
    pub date: NaiveDateTime,
    pub completed: bool,
}

impl HistoryEntry {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_tasks: usize,
    pub today_task_count: usize,
    pub completed_today: usize,
    pub completion_rate_percent: u32,
    pub streak_days: u32,
}

/// Dashboard numbers for `today`.
///
/// Completions are counted per task, not per entry: several completed entries
/// for one task on one day count once.
pub fn compute_stats(tasks: &[Task], history: &[HistoryEntry], today: NaiveDate) -> Stats {
    let today_task_count = tasks_on(tasks, today).count();
    let completed_today = completed_on(history, today).len();

    Stats {
        total_tasks: tasks.len(),
        today_task_count,
        completed_today,
        completion_rate_percent: completion_rate(completed_today, today_task_count),
        streak_days: streak(tasks, history, today),
    }
}

fn tasks_on(tasks: &[Task], date: NaiveDate) -> impl Iterator<Item = &Task> {
    let day = Day::from_chrono(date.weekday());
    tasks.iter().filter(move |task| task.recurs_on(day))
}

fn completed_on(history: &[HistoryEntry], date: NaiveDate) -> HashSet<&TaskId> {
    history
        .iter()
        .filter(|entry| entry.completed && entry.day() == date)
        .map(|entry| &entry.task_id)
        .collect()
}

/// Percentage rounded half-up; zero when nothing is scheduled.
fn completion_rate(completed: usize, scheduled: usize) -> u32 {
    if scheduled == 0 {
        return 0;
    }
    ((completed * 100 + scheduled / 2) / scheduled) as u32
}

/// Consecutive fully completed days ending today. A day with nothing
/// scheduled ends the streak rather than being skipped.
fn streak(tasks: &[Task], history: &[HistoryEntry], today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut date = today;
    for _ in 0..STREAK_LOOKBACK_DAYS {
        let scheduled: Vec<&Task> = tasks_on(tasks, date).collect();
        if scheduled.is_empty() {
            break;
        }
        let completed = completed_on(history, date);
        if scheduled.iter().any(|task| !completed.contains(&task.id)) {
            break;
        }
        streak += 1;
        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
    }
    streak
}
