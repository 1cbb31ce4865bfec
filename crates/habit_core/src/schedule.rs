use chrono::{Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::conflict::{validate, ConflictReason};
use crate::notifications::{plan_reminders, NotificationRequest};
use crate::stats::{compute_stats, HistoryEntry, Stats};
use crate::status::{classify, TaskStatus};
use crate::task::{Day, SleepWindow, Task, TaskDraft, TaskId};
use crate::time::TimeOfDay;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("no task with id `{0}`")]
    UnknownTask(TaskId),
    #[error(transparent)]
    Rejected(#[from] ConflictReason),
}

/// A complete snapshot of tasks, sleep window and completion history.
///
/// The caller loads it whole, applies operations, and writes it back whole.
/// Every operation that would break the no-overlap invariants is refused
/// and leaves the snapshot untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    tasks: Vec<Task>,
    sleep: Option<SleepWindow>,
    history: Vec<HistoryEntry>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(
        tasks: Vec<Task>,
        sleep: Option<SleepWindow>,
        history: Vec<HistoryEntry>,
    ) -> Self {
        Self {
            tasks,
            sleep,
            history,
        }
    }

    pub fn into_parts(self) -> (Vec<Task>, Option<SleepWindow>, Vec<HistoryEntry>) {
        (self.tasks, self.sleep, self.history)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn sleep_window(&self) -> Option<&SleepWindow> {
        self.sleep.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    /// A fresh id from the creation time, bumped past any id already taken.
    /// `now` is local wall-clock time and is resolved in the local zone.
    pub fn next_task_id(&self, now: NaiveDateTime) -> TaskId {
        // A wall-clock time skipped by a DST jump has no instant; any unique
        // id does for it.
        let mut candidate = Local
            .from_local_datetime(&now)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| now.and_utc());
        loop {
            let id = TaskId::from_timestamp(&candidate);
            if self.task(&id).is_none() {
                return id;
            }
            candidate += Duration::milliseconds(1);
        }
    }

    /// Validate `draft` and insert it, or replace the task with the same id.
    /// Edits keep the task's `done` flag.
    #[instrument(skip(self, draft), fields(id = %draft.id))]
    pub fn save_task(&mut self, draft: &TaskDraft) -> Result<Task, ScheduleError> {
        let mut task = validate(draft, &self.tasks, self.sleep.as_ref())?;
        match self.tasks.iter_mut().find(|existing| existing.id == task.id) {
            Some(existing) => {
                task.done = existing.done;
                *existing = task.clone();
                debug!(title = %task.title, "task updated");
            }
            None => {
                self.tasks.push(task.clone());
                info!(title = %task.title, "task created");
            }
        }
        Ok(task)
    }

    /// Remove a task. Its history entries are kept and simply dangle.
    #[instrument(skip(self))]
    pub fn delete_task(&mut self, id: &TaskId) -> Result<Task, ScheduleError> {
        let index = self
            .tasks
            .iter()
            .position(|task| &task.id == id)
            .ok_or_else(|| ScheduleError::UnknownTask(id.clone()))?;
        let removed = self.tasks.remove(index);
        info!(title = %removed.title, "task deleted");
        Ok(removed)
    }

    /// Flip a task's `done` flag and record the outcome in the history,
    /// replacing any earlier entry for that task on the same day.
    /// Returns the new flag.
    #[instrument(skip(self))]
    pub fn toggle_done(&mut self, id: &TaskId, at: NaiveDateTime) -> Result<bool, ScheduleError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| &task.id == id)
            .ok_or_else(|| ScheduleError::UnknownTask(id.clone()))?;
        task.done = !task.done;
        let done = task.done;

        let day = at.date();
        self.history
            .retain(|entry| !(&entry.task_id == id && entry.day() == day));
        self.history.push(HistoryEntry {
            task_id: id.clone(),
            date: at,
            completed: done,
        });
        debug!(done, "task toggled");
        Ok(done)
    }

    /// Replace the sleep window. Existing tasks are not re-checked; see
    /// [`Schedule::sleep_conflicts`]. A window whose ends coincide would
    /// cover the whole day and is refused.
    pub fn set_sleep_window(&mut self, window: Option<SleepWindow>) -> Result<(), ScheduleError> {
        if window.is_some_and(|window| window.span().is_degenerate()) {
            return Err(ConflictReason::DegenerateRange.into());
        }
        debug!(?window, "sleep window replaced");
        self.sleep = window;
        Ok(())
    }

    /// Tasks whose span overlaps the current sleep window.
    pub fn sleep_conflicts(&self) -> Vec<&Task> {
        let Some(window) = &self.sleep else {
            return Vec::new();
        };
        let sleep_span = window.span();
        self.tasks
            .iter()
            .filter(|task| task.span().overlaps(&sleep_span))
            .collect()
    }

    /// Tasks recurring on `day`, earliest start first.
    pub fn tasks_on(&self, day: Day) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| task.recurs_on(day))
            .collect();
        tasks.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.title.cmp(&b.title))
        });
        tasks
    }

    pub fn statuses(&self, now: TimeOfDay) -> Vec<(&Task, TaskStatus)> {
        self.tasks
            .iter()
            .map(|task| (task, classify(task, now)))
            .collect()
    }

    pub fn stats(&self, today: NaiveDate) -> Stats {
        compute_stats(&self.tasks, &self.history, today)
    }

    pub fn reminders(&self, now: NaiveDateTime, lead: Duration) -> Vec<NotificationRequest> {
        plan_reminders(&self.tasks, now, lead)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> TimeOfDay {
        text.parse().unwrap()
    }

    fn wednesday(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 10, 22)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn gym(id: &TaskId) -> TaskDraft {
        TaskDraft::new(id.clone())
            .title("Gym")
            .between(at("18:00"), at("19:00"))
            .on([Day::Mon, Day::Wed])
    }

    #[test]
    fn save_creates_then_edits_preserving_done() {
        let mut schedule = Schedule::new();
        let id = schedule.next_task_id(wednesday(7, 0));
        schedule.save_task(&gym(&id)).unwrap();
        assert_eq!(schedule.tasks().len(), 1);

        assert!(schedule.toggle_done(&id, wednesday(19, 5)).unwrap());

        let edited = gym(&id).between(at("17:00"), at("18:00"));
        let saved = schedule.save_task(&edited).unwrap();
        assert!(saved.done);
        assert_eq!(schedule.tasks().len(), 1);
        assert_eq!(schedule.tasks()[0].start, at("17:00"));
    }

    #[test]
    fn rejected_draft_leaves_snapshot_untouched() {
        let mut schedule = Schedule::new();
        schedule
            .set_sleep_window(Some(SleepWindow::new(at("23:00"), at("07:00"))))
            .unwrap();
        let before = schedule.clone();
        let late = TaskDraft::new(TaskId::new("1"))
            .title("Late run")
            .between(at("06:00"), at("07:30"))
            .on([Day::Sun]);
        let err = schedule.save_task(&late).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::Rejected(ConflictReason::SleepConflict { .. })
        ));
        assert_eq!(schedule, before);
    }

    #[test]
    fn toggling_twice_on_one_day_keeps_one_history_entry() {
        let mut schedule = Schedule::new();
        let id = TaskId::new("1");
        schedule.save_task(&gym(&id)).unwrap();

        schedule.toggle_done(&id, wednesday(19, 0)).unwrap();
        assert!(!schedule.toggle_done(&id, wednesday(19, 30)).unwrap());
        assert_eq!(schedule.history().len(), 1);
        assert!(!schedule.history()[0].completed);
        assert_eq!(schedule.history()[0].date, wednesday(19, 30));

        let thursday = wednesday(9, 0) + Duration::days(1);
        schedule.toggle_done(&id, thursday).unwrap();
        assert_eq!(schedule.history().len(), 2);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut schedule = Schedule::new();
        let missing = TaskId::new("nope");
        assert_eq!(
            schedule.toggle_done(&missing, wednesday(9, 0)),
            Err(ScheduleError::UnknownTask(missing.clone()))
        );
        assert_eq!(
            schedule.delete_task(&missing),
            Err(ScheduleError::UnknownTask(missing))
        );
    }

    #[test]
    fn delete_keeps_history() {
        let mut schedule = Schedule::new();
        let id = TaskId::new("1");
        schedule.save_task(&gym(&id)).unwrap();
        schedule.toggle_done(&id, wednesday(19, 0)).unwrap();
        schedule.delete_task(&id).unwrap();
        assert!(schedule.tasks().is_empty());
        assert_eq!(schedule.history().len(), 1);
    }

    #[test]
    fn next_task_id_is_epoch_millis_of_local_time() {
        let schedule = Schedule::new();
        let now = wednesday(7, 0);
        let expected = Local
            .from_local_datetime(&now)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(schedule.next_task_id(now), TaskId::new(expected.to_string()));
    }

    #[test]
    fn next_task_id_skips_taken_ids() {
        let mut schedule = Schedule::new();
        let now = wednesday(7, 0);
        let first = schedule.next_task_id(now);
        schedule.save_task(&gym(&first)).unwrap();
        let second = schedule.next_task_id(now);
        assert_ne!(first, second);
    }

    #[test]
    fn sleep_window_change_surfaces_existing_conflicts() {
        let mut schedule = Schedule::new();
        schedule.save_task(&gym(&TaskId::new("1"))).unwrap();
        assert!(schedule.sleep_conflicts().is_empty());
        schedule
            .set_sleep_window(Some(SleepWindow::new(at("18:30"), at("06:00"))))
            .unwrap();
        assert_eq!(schedule.sleep_conflicts().len(), 1);
    }

    #[test]
    fn sleep_window_with_equal_ends_is_refused() {
        let mut schedule = Schedule::new();
        let whole_day = SleepWindow::new(at("22:00"), at("22:00"));
        assert_eq!(
            schedule.set_sleep_window(Some(whole_day)),
            Err(ScheduleError::Rejected(ConflictReason::DegenerateRange))
        );
        assert!(schedule.sleep_window().is_none());

        let lunch = TaskDraft::new(TaskId::new("1"))
            .title("Lunch")
            .between(at("12:00"), at("12:30"))
            .on([Day::Mon]);
        assert!(schedule.save_task(&lunch).is_ok());
        assert_eq!(schedule.set_sleep_window(None), Ok(()));
    }

    #[test]
    fn tasks_on_orders_by_start() {
        let mut schedule = Schedule::new();
        schedule.save_task(&gym(&TaskId::new("1"))).unwrap();
        let breakfast = TaskDraft::new(TaskId::new("2"))
            .title("Breakfast")
            .between(at("07:00"), at("07:30"))
            .on(Day::ALL);
        schedule.save_task(&breakfast).unwrap();

        let titles: Vec<&str> = schedule
            .tasks_on(Day::Wed)
            .into_iter()
            .map(|task| task.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Breakfast", "Gym"]);
        assert_eq!(schedule.tasks_on(Day::Tue).len(), 1);

        let statuses = schedule.statuses(at("07:15"));
        assert!(statuses
            .iter()
            .any(|(task, status)| task.title == "Breakfast" && *status == TaskStatus::Current));

        let stats = schedule.stats(wednesday(0, 0).date());
        assert_eq!(stats.today_task_count, 2);
        assert_eq!(schedule.reminders(wednesday(6, 0), Duration::minutes(10)).len(), 2);
    }
}
