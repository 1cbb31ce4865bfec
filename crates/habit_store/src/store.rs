use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use habit_core::notifications::NotificationSink;
use habit_core::{Schedule, ScheduleError};
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::error::StoreError;
use crate::record::{
    decode_history, decode_sleep, decode_tasks, encode, SleepRecord, HISTORY_DOCUMENT,
    SLEEP_DOCUMENT, TASKS_DOCUMENT,
};

pub const DEFAULT_REMINDER_LEAD_MINUTES: i64 = 10;

/// File-backed home of one [`Schedule`].
///
/// Every write replaces whole documents, and reads always produce a complete
/// snapshot. The last snapshot read or written is cached.
pub struct HabitStore {
    data_dir: PathBuf,
    cache: RwLock<Schedule>,
    notification_sink: Option<Box<dyn NotificationSink>>,
    reminder_lead: Duration,
}

pub struct HabitStoreBuilder {
    data_dir: PathBuf,
    notification_sink: Option<Box<dyn NotificationSink>>,
    reminder_lead: Duration,
}

impl HabitStoreBuilder {
    pub fn new() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            notification_sink: None,
            reminder_lead: Duration::minutes(DEFAULT_REMINDER_LEAD_MINUTES),
        }
    }

    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn with_notification_sink(mut self, sink: Box<dyn NotificationSink>) -> Self {
        self.notification_sink = Some(sink);
        self
    }

    pub fn reminder_lead(mut self, lead: Duration) -> Self {
        self.reminder_lead = lead;
        self
    }

    pub fn build(self) -> Result<HabitStore, StoreError> {
        fs::create_dir_all(&self.data_dir).map_err(|err| StoreError::io(&self.data_dir, err))?;
        let store = HabitStore {
            data_dir: self.data_dir,
            cache: RwLock::new(Schedule::new()),
            notification_sink: self.notification_sink,
            reminder_lead: self.reminder_lead,
        };
        store.load()?;
        Ok(store)
    }
}

impl Default for HabitStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitStore {
    pub fn builder() -> HabitStoreBuilder {
        HabitStoreBuilder::new()
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Re-read every document from disk and refresh the cache.
    #[instrument(skip(self), fields(dir = %self.data_dir.display()))]
    pub fn load(&self) -> Result<Schedule, StoreError> {
        let mut cache = self.cache.write();
        let schedule = self.read_schedule()?;
        *cache = schedule.clone();
        Ok(schedule)
    }

    /// The cached snapshot, without touching disk.
    pub fn snapshot(&self) -> Schedule {
        self.cache.read().clone()
    }

    pub fn commit(&self, schedule: Schedule) -> Result<(), StoreError> {
        self.commit_at(schedule, Local::now().naive_local())
    }

    /// Persist `schedule` whole and re-plan reminders as of `now`.
    #[instrument(skip(self, schedule), fields(dir = %self.data_dir.display()))]
    pub fn commit_at(&self, schedule: Schedule, now: NaiveDateTime) -> Result<(), StoreError> {
        let mut cache = self.cache.write();
        self.write_schedule(&schedule)?;
        self.replan_reminders(&schedule, now);
        *cache = schedule;
        Ok(())
    }

    pub fn update<T>(
        &self,
        change: impl FnOnce(&mut Schedule, NaiveDateTime) -> Result<T, ScheduleError>,
    ) -> Result<T, StoreError> {
        self.update_at(Local::now().naive_local(), change)
    }

    /// Read the current documents, apply `change`, and write the result back,
    /// all under the store's write lock. Nothing is written when `change`
    /// fails.
    #[instrument(skip(self, change), fields(dir = %self.data_dir.display()))]
    pub fn update_at<T>(
        &self,
        now: NaiveDateTime,
        change: impl FnOnce(&mut Schedule, NaiveDateTime) -> Result<T, ScheduleError>,
    ) -> Result<T, StoreError> {
        let mut cache = self.cache.write();
        let mut schedule = self.read_schedule()?;
        let value = change(&mut schedule, now)?;
        self.write_schedule(&schedule)?;
        self.replan_reminders(&schedule, now);
        *cache = schedule;
        Ok(value)
    }
}

impl HabitStore {
    fn document_path(&self, document: &str) -> PathBuf {
        self.data_dir.join(document)
    }

    fn read_schedule(&self) -> Result<Schedule, StoreError> {
        let tasks = match self.read_document(TASKS_DOCUMENT)? {
            Some(raw) => decode_tasks(&raw)?,
            None => Vec::new(),
        };
        let sleep = match self.read_document(SLEEP_DOCUMENT)? {
            Some(raw) => decode_sleep(&raw)?,
            None => None,
        };
        let history = match self.read_document(HISTORY_DOCUMENT)? {
            Some(raw) => decode_history(&raw)?,
            None => Vec::new(),
        };
        debug!(
            tasks = tasks.len(),
            history = history.len(),
            sleep_set = sleep.is_some(),
            "snapshot loaded"
        );
        Ok(Schedule::from_parts(tasks, sleep, history))
    }

    fn read_document(&self, document: &str) -> Result<Option<String>, StoreError> {
        let path = self.document_path(document);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::io(path, err)),
        }
    }

    fn write_schedule(&self, schedule: &Schedule) -> Result<(), StoreError> {
        let tasks = encode(TASKS_DOCUMENT, schedule.tasks())?;
        let sleep = encode(SLEEP_DOCUMENT, &SleepRecord::from(schedule.sleep_window()))?;
        let history = encode(HISTORY_DOCUMENT, schedule.history())?;
        self.write_document(TASKS_DOCUMENT, &tasks)?;
        self.write_document(SLEEP_DOCUMENT, &sleep)?;
        self.write_document(HISTORY_DOCUMENT, &history)?;
        info!(
            tasks = schedule.tasks().len(),
            history = schedule.history().len(),
            "snapshot committed"
        );
        Ok(())
    }

    /// Write through a sibling temp file so a reader never sees half a document.
    fn write_document(&self, document: &str, contents: &str) -> Result<(), StoreError> {
        let path = self.document_path(document);
        let staging = self.document_path(&format!("{document}.tmp"));
        fs::write(&staging, contents).map_err(|err| StoreError::io(&staging, err))?;
        fs::rename(&staging, &path).map_err(|err| StoreError::io(&path, err))
    }

    fn replan_reminders(&self, schedule: &Schedule, now: NaiveDateTime) {
        let Some(sink) = &self.notification_sink else {
            return;
        };
        sink.clear_all();
        let reminders = schedule.reminders(now, self.reminder_lead);
        debug!(count = reminders.len(), "reminders planned");
        for reminder in reminders {
            sink.schedule(reminder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::{Day, TaskDraft, TaskId};

    #[test]
    fn empty_directory_loads_empty_schedule() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HabitStore::builder()
            .data_dir(temp.path().join("nested"))
            .build()
            .expect("build store");
        assert_eq!(store.snapshot(), Schedule::new());
        assert!(store.data_dir().is_dir());
    }

    #[test]
    fn failed_update_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = HabitStore::builder()
            .data_dir(temp.path())
            .build()
            .expect("build store");

        let blank = TaskDraft::new(TaskId::new("1")).on([Day::Mon]);
        let result = store.update(|schedule, _| schedule.save_task(&blank));
        assert!(matches!(result, Err(StoreError::Schedule(_))));
        assert!(!temp.path().join(TASKS_DOCUMENT).exists());
    }
}
