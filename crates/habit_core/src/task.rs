use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Weekday};
use serde::{Deserialize, Serialize};

use crate::span::Span;
use crate::time::TimeOfDay;

/// Weekday labels as stored with each task, Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sun,
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Sun => "Sun",
            Day::Mon => "Mon",
            Day::Tue => "Tue",
            Day::Wed => "Wed",
            Day::Thu => "Thu",
            Day::Fri => "Fri",
            Day::Sat => "Sat",
        }
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun => Day::Sun,
            Weekday::Mon => Day::Mon,
            Weekday::Tue => Day::Tue,
            Weekday::Wed => Day::Wed,
            Weekday::Thu => Day::Thu,
            Weekday::Fri => Day::Fri,
            Weekday::Sat => Day::Sat,
        }
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Day::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| format!("unknown day `{s}`"))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The weekdays a task recurs on. Order is irrelevant and duplicates collapse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet(BTreeSet<Day>);

impl DaySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn every_day() -> Self {
        Day::ALL.into_iter().collect()
    }

    pub fn contains(&self, day: Day) -> bool {
        self.0.contains(&day)
    }

    pub fn insert(&mut self, day: Day) -> bool {
        self.0.insert(day)
    }

    pub fn remove(&mut self, day: Day) -> bool {
        self.0.remove(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Day> + '_ {
        self.0.iter().copied()
    }

    pub fn shared_with<'a>(&'a self, other: &'a DaySet) -> impl Iterator<Item = Day> + 'a {
        self.0.intersection(&other.0).copied()
    }
}

impl FromIterator<Day> for DaySet {
    fn from_iter<I: IntoIterator<Item = Day>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Day> for DaySet {
    fn extend<I: IntoIterator<Item = Day>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl fmt::Display for DaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(Day::as_str).collect();
        f.write_str(&labels.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id derived from a creation instant, in epoch milliseconds.
    pub fn from_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self(at.timestamp_millis().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub days: DaySet,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn recurs_on(&self, day: Day) -> bool {
        self.days.contains(day)
    }
}

/// A task as entered in a create or edit form, before it has been accepted.
/// Times stay optional until validation confirms both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: TaskId,
    pub title: String,
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
    pub days: DaySet,
}

impl TaskDraft {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            title: String::new(),
            start: None,
            end: None,
            days: DaySet::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn between(mut self, start: TimeOfDay, end: TimeOfDay) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn on(mut self, days: impl IntoIterator<Item = Day>) -> Self {
        self.days.extend(days);
        self
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            start: Some(task.start),
            end: Some(task.end),
            days: task.days.clone(),
        }
    }
}

/// The global nightly sleep period. It may wrap past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl SleepWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_set_collapses_duplicates_and_serializes_in_week_order() {
        let days: DaySet = [Day::Fri, Day::Mon, Day::Fri, Day::Sun].into_iter().collect();
        assert_eq!(days.len(), 3);
        assert_eq!(serde_json::to_string(&days).unwrap(), r#"["Sun","Mon","Fri"]"#);
        assert_eq!(days.to_string(), "Sun, Mon, Fri");
    }

    #[test]
    fn task_json_mirrors_stored_field_names() {
        let raw = r#"{"id":"1718000000000","title":"Gym","start":"18:00","end":"19:30","days":["Mon","Wed"],"done":false}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.id.as_str(), "1718000000000");
        assert_eq!(task.start, TimeOfDay::from_hm(18, 0).unwrap());
        assert!(task.recurs_on(Day::Wed));
        assert!(!task.recurs_on(Day::Tue));
        assert_eq!(serde_json::to_string(&task).unwrap(), raw);
    }

    #[test]
    fn unknown_day_label_is_rejected() {
        let raw = r#"{"id":"1","title":"Gym","start":"18:00","end":"19:30","days":["Monday"]}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
        assert!("Monday".parse::<Day>().is_err());
        assert_eq!("Thu".parse::<Day>(), Ok(Day::Thu));
    }

    #[test]
    fn task_id_from_timestamp_uses_epoch_millis() {
        let naive = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_milli_opt(0, 0, 0, 250)
            .unwrap();
        let utc = chrono::Utc.from_utc_datetime(&naive);
        assert_eq!(TaskId::from_timestamp(&utc).as_str(), "1704067200250");

        let shifted = chrono::FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .from_utc_datetime(&naive);
        assert_eq!(TaskId::from_timestamp(&shifted), TaskId::from_timestamp(&utc));
    }
}
