//! Half-open time-of-day spans on the circular 24h clock.
//!
//! A span whose end is not after its start wraps past midnight, so
//! `23:00-02:00` covers the last hour of one day and the first two of the next.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::time::{TimeOfDay, MINUTES_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Span {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// A span with `start == end` covers no usable range; callers reject it.
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// `(start, end')` where `end' > start`, adding a day to the end of
    /// overnight spans. `end'` lies in `(start, start + 1440]`.
    pub fn normalized(&self) -> (u16, u16) {
        let start = self.start.minutes();
        let end = self.end.minutes();
        if end <= start {
            (start, end + MINUTES_PER_DAY)
        } else {
            (start, end)
        }
    }

    pub fn duration_minutes(&self) -> u16 {
        let (start, end) = self.normalized();
        end - start
    }

    /// The span split into at most two non-wrapping pieces of `[0, 1440)`.
    pub fn segments(&self) -> impl Iterator<Item = Range<u16>> {
        let start = self.start.minutes();
        let end = self.end.minutes();
        let (first, second) = if end > start {
            (start..end, None)
        } else {
            (start..MINUTES_PER_DAY, Some(0..end))
        };
        std::iter::once(first)
            .chain(second)
            .filter(|segment| !segment.is_empty())
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.segments().any(|ours| {
            other
                .segments()
                .any(|theirs| ours.start.max(theirs.start) < ours.end.min(theirs.end))
        })
    }

    /// Display form, e.g. `11:00 PM – 6:00 AM`.
    pub fn format_12h(&self) -> String {
        format!("{} – {}", self.start.format_12h(), self.end.format_12h())
    }
}

/// Whether two possibly-overnight spans share at least one minute.
/// Touching endpoints do not overlap.
pub fn overlaps(a: &Span, b: &Span) -> bool {
    a.overlaps(b)
}
