use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::{Day, Task};

pub const REMINDER_TITLE: &str = "Upcoming Task";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Stable per task and day; a sink fires at most once per identifier.
    pub id: String,
    pub title: String,
    pub body: String,
    /// Local wall-clock time the reminder should fire.
    pub scheduled_for: NaiveDateTime,
}

/// Delivers reminders to whatever scheduler the host device provides.
pub trait NotificationSink: Send + Sync {
    fn schedule(&self, notification: NotificationRequest);
    fn clear_all(&self);
}

/// Reminders for today's open tasks, `lead` ahead of each start time.
///
/// Reminders whose fire time is not after `now` are skipped.
pub fn plan_reminders(
    tasks: &[Task],
    now: NaiveDateTime,
    lead: Duration,
) -> Vec<NotificationRequest> {
    let today = now.date();
    let day = Day::from_chrono(today.weekday());

    let mut requests: Vec<NotificationRequest> = tasks
        .iter()
        .filter(|task| !task.done && task.recurs_on(day))
        .filter_map(|task| {
            let fires_at = today.and_time(task.start.to_naive_time()) - lead;
            (fires_at > now).then(|| NotificationRequest {
                id: format!("{}@{}", task.id, today.format("%Y-%m-%d")),
                title: REMINDER_TITLE.to_string(),
                body: format!("{} at {}", task.title, task.start.format_12h()),
                scheduled_for: fires_at,
            })
        })
        .collect();
    requests.sort_by(|a, b| {
        a.scheduled_for
            .cmp(&b.scheduled_for)
            .then_with(|| a.id.cmp(&b.id))
    });
    requests
}
