//! Decoding and encoding of the stored JSON documents.
//!
//! Each document holds one whole collection. Decoding refuses anything that
//! does not fit the typed model instead of filling in defaults.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDateTime};
use habit_core::{HistoryEntry, SleepWindow, Task, TaskId, TimeOfDay};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub const TASKS_DOCUMENT: &str = "tasks.json";
pub const SLEEP_DOCUMENT: &str = "sleep.json";
pub const HISTORY_DOCUMENT: &str = "taskHistory.json";

/// Stored sleep window; unset is a pair of empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepRecord {
    pub start: String,
    pub end: String,
}

impl From<Option<&SleepWindow>> for SleepRecord {
    fn from(window: Option<&SleepWindow>) -> Self {
        match window {
            Some(window) => SleepRecord {
                start: window.start.to_string(),
                end: window.end.to_string(),
            },
            None => SleepRecord::default(),
        }
    }
}

/// Stored history entry. `date` is either an RFC 3339 timestamp or a naive
/// local one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub task_id: String,
    pub date: String,
    pub completed: bool,
}

pub fn decode_tasks(raw: &str) -> Result<Vec<Task>, StoreError> {
    let tasks: Vec<Task> = serde_json::from_str(raw).map_err(|source| StoreError::Json {
        document: TASKS_DOCUMENT,
        source,
    })?;

    let mut ids: HashSet<&TaskId> = HashSet::new();
    let mut titles: HashSet<&str> = HashSet::new();
    for (index, task) in tasks.iter().enumerate() {
        let invalid = |reason: &str| StoreError::invalid(TASKS_DOCUMENT, index, reason);
        if task.title.trim().is_empty() {
            return Err(invalid("empty title"));
        }
        if task.days.is_empty() {
            return Err(invalid("no days selected"));
        }
        if task.span().is_degenerate() {
            return Err(invalid("start and end time are the same"));
        }
        if !ids.insert(&task.id) {
            return Err(invalid(&format!("duplicate id `{}`", task.id)));
        }
        if !titles.insert(task.title.as_str()) {
            return Err(invalid(&format!("duplicate title `{}`", task.title)));
        }
    }
    Ok(tasks)
}

pub fn decode_sleep(raw: &str) -> Result<Option<SleepWindow>, StoreError> {
    let record: SleepRecord = serde_json::from_str(raw).map_err(|source| StoreError::Json {
        document: SLEEP_DOCUMENT,
        source,
    })?;
    let parse = |text: &str| {
        text.parse::<TimeOfDay>()
            .map_err(|err| StoreError::invalid(SLEEP_DOCUMENT, 0, err.to_string()))
    };
    match (record.start.is_empty(), record.end.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => {
            let window = SleepWindow::new(parse(&record.start)?, parse(&record.end)?);
            if window.span().is_degenerate() {
                return Err(StoreError::invalid(
                    SLEEP_DOCUMENT,
                    0,
                    "start and end time are the same",
                ));
            }
            Ok(Some(window))
        }
        _ => Err(StoreError::invalid(
            SLEEP_DOCUMENT,
            0,
            "only one end of the sleep window is set",
        )),
    }
}

pub fn decode_history(raw: &str) -> Result<Vec<HistoryEntry>, StoreError> {
    let records: Vec<HistoryRecord> =
        serde_json::from_str(raw).map_err(|source| StoreError::Json {
            document: HISTORY_DOCUMENT,
            source,
        })?;
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            if record.task_id.is_empty() {
                return Err(StoreError::invalid(HISTORY_DOCUMENT, index, "empty task id"));
            }
            let date = parse_timestamp(&record.date).ok_or_else(|| {
                StoreError::invalid(
                    HISTORY_DOCUMENT,
                    index,
                    format!("unrecognised timestamp `{}`", record.date),
                )
            })?;
            Ok(HistoryEntry {
                task_id: TaskId::new(record.task_id),
                date,
                completed: record.completed,
            })
        })
        .collect()
}

/// Timestamps with an offset are moved to the local zone before the calendar
/// day is taken from them.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(stamped) = DateTime::parse_from_rfc3339(text) {
        return Some(stamped.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

pub fn encode<T: Serialize + ?Sized>(
    document: &'static str,
    value: &T,
) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Json { document, source })
}
