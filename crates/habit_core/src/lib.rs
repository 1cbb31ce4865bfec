pub mod conflict;
pub mod notifications;
pub mod schedule;
pub mod span;
pub mod stats;
pub mod status;
pub mod task;
pub mod time;

pub use crate::conflict::{validate, ConflictReason};
pub use crate::schedule::{Schedule, ScheduleError};
pub use crate::span::{overlaps, Span};
pub use crate::stats::{compute_stats, HistoryEntry, Stats};
pub use crate::status::{classify, TaskStatus};
pub use crate::task::{Day, DaySet, SleepWindow, Task, TaskDraft, TaskId};
pub use crate::time::{format_12h, TimeError, TimeOfDay};
