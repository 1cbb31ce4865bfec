use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDateTime};
use habit_core::notifications::{NotificationRequest, NotificationSink};
use habit_core::{classify, Day, Schedule, TimeOfDay};
use habit_store::HabitStore;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) reminder_lead_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_vars(|key| std::env::var(key).ok()))
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = var("HABIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(lead) = var("HABIT_REMINDER_LEAD_MINUTES") {
            match lead.trim().parse::<i64>() {
                Ok(value) if value >= 0 => config.reminder_lead_minutes = value,
                _ => warn!(value = %lead, "ignoring invalid HABIT_REMINDER_LEAD_MINUTES"),
            }
        }
        config
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("habit-data"),
            reminder_lead_minutes: 10,
        }
    }
}

/// Stands in for the OS notification scheduler when running headless.
struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn schedule(&self, notification: NotificationRequest) {
        info!(
            id = %notification.id,
            at = %notification.scheduled_for,
            body = %notification.body,
            "reminder scheduled"
        );
    }

    fn clear_all(&self) {
        info!("pending reminders cleared");
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(dir = %config.data_dir.display(), "opening habit store");
    let store = HabitStore::builder()
        .data_dir(&config.data_dir)
        .reminder_lead(Duration::minutes(config.reminder_lead_minutes))
        .with_notification_sink(Box::new(LogNotificationSink))
        .build()
        .with_context(|| format!("unable to open {}", config.data_dir.display()))?;

    let schedule = store.snapshot();
    let now = Local::now().naive_local();
    print!("{}", render_dashboard(&schedule, now));

    store
        .commit_at(schedule, now)
        .context("unable to re-plan reminders")?;
    Ok(())
}

/// Encouragement shown under the streak, by streak length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTier {
    StartSmall,
    GreatMomentum,
    Unstoppable,
}

impl StreakTier {
    pub fn for_streak(days: u32) -> Self {
        if days >= 7 {
            StreakTier::Unstoppable
        } else if days >= 3 {
            StreakTier::GreatMomentum
        } else {
            StreakTier::StartSmall
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            StreakTier::Unstoppable => "You're Unstoppable!",
            StreakTier::GreatMomentum => "Great Momentum!",
            StreakTier::StartSmall => "Start Small, Win Big",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            StreakTier::Unstoppable => "Your consistency is amazing. Keep pushing!",
            StreakTier::GreatMomentum => "You're building a strong habit. Stay focused!",
            StreakTier::StartSmall => "Complete today's tasks to start your streak.",
        }
    }
}

/// Today's schedule, statuses and statistics as plain text.
pub fn render_dashboard(schedule: &Schedule, now: NaiveDateTime) -> String {
    Dashboard { schedule, now }.to_string()
}

struct Dashboard<'a> {
    schedule: &'a Schedule,
    now: NaiveDateTime,
}

impl fmt::Display for Dashboard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schedule = self.schedule;
        let today = self.now.date();
        let day = Day::from_chrono(today.weekday());
        let clock = TimeOfDay::from(self.now.time());

        writeln!(f, "Daily Schedule – {} {}", day, today.format("%Y-%m-%d"))?;
        match schedule.sleep_window() {
            Some(window) => writeln!(
                f,
                "Sleep: {} → {}",
                window.start.format_12h(),
                window.end.format_12h()
            )?,
            None => writeln!(f, "Sleep: not set")?,
        }
        for task in schedule.sleep_conflicts() {
            writeln!(f, "  ! {} overlaps the sleep window", task.title)?;
        }

        let todays = schedule.tasks_on(day);
        if todays.is_empty() {
            writeln!(f, "No tasks today")?;
        }
        for task in todays {
            writeln!(
                f,
                "[{:<8}] {} → {}  {}  ({})",
                classify(task, clock).label(),
                task.start.format_12h(),
                task.end.format_12h(),
                task.title,
                task.days
            )?;
        }

        let stats = schedule.stats(today);
        let tier = StreakTier::for_streak(stats.streak_days);
        writeln!(f, "Total tasks: {}", stats.total_tasks)?;
        writeln!(f, "Today's tasks: {}", stats.today_task_count)?;
        writeln!(f, "Completed today: {}", stats.completed_today)?;
        writeln!(f, "Completion: {}%", stats.completion_rate_percent)?;
        writeln!(f, "Streak: {} day(s)", stats.streak_days)?;
        writeln!(f, "{} {}", tier.headline(), tier.advice())
    }
}
