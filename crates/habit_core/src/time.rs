use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MINUTES_PER_DAY: u16 = 1440;

/// Shown in place of a time that could not be parsed.
pub const TIME_PLACEHOLDER: &str = "--:--";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    #[error("invalid time of day `{0}`, expected HH:MM")]
    InvalidTimeFormat(String),
    #[error("minute of day {0} is out of range")]
    OutOfRange(u16),
}

/// A wall-clock time with minute resolution, stored as minutes past midnight.
///
/// The textual form is `HH:MM` (24h). Parsing is strict: there is no fallback
/// to midnight for malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_minutes(minutes: u16) -> Result<Self, TimeError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(TimeError::OutOfRange(minutes));
        }
        Ok(Self(minutes))
    }

    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, TimeError> {
        if hour >= 24 || minute >= 60 {
            return Err(TimeError::InvalidTimeFormat(format!("{hour}:{minute:02}")));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Formats as `H:MM AM` / `H:MM PM`, e.g. `12:05 AM` or `9:30 PM`.
    pub fn format_12h(self) -> String {
        let hour = self.hour();
        let suffix = if hour >= 12 { "PM" } else { "AM" };
        let display_hour = match hour % 12 {
            0 => 12,
            h => h,
        };
        format!("{}:{:02} {}", display_hour, self.minute(), suffix)
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Always in range: both components were validated on construction.
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeError::InvalidTimeFormat(text.to_string());
        let (hour, minute) = text.trim().split_once(':').ok_or_else(invalid)?;
        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hour) || hour.len() > 2 || !all_digits(minute) || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        if hour >= 24 || minute >= 60 {
            return Err(invalid());
        }
        Ok(Self(hour * 60 + minute))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// Formats raw `HH:MM` text for display, falling back to [`TIME_PLACEHOLDER`].
pub fn format_12h(text: &str) -> String {
    text.parse::<TimeOfDay>()
        .map(TimeOfDay::format_12h)
        .unwrap_or_else(|_| TIME_PLACEHOLDER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_and_unpadded_hours() {
        assert_eq!("09:30".parse::<TimeOfDay>().unwrap().minutes(), 570);
        assert_eq!("9:30".parse::<TimeOfDay>().unwrap().minutes(), 570);
        assert_eq!(" 23:59 ".parse::<TimeOfDay>().unwrap().minutes(), 1439);
        assert_eq!("00:00".parse::<TimeOfDay>().unwrap(), TimeOfDay::MIDNIGHT);
    }

    #[test]
    fn rejects_malformed_text_instead_of_defaulting_to_midnight() {
        for text in ["", "0930", "24:00", "12:60", "ab:cd", "12:5", "-1:30", "123:00", "12:30:00"] {
            assert_eq!(
                text.parse::<TimeOfDay>(),
                Err(TimeError::InvalidTimeFormat(text.to_string())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(TimeOfDay::from_hm(0, 5).unwrap().format_12h(), "12:05 AM");
        assert_eq!(TimeOfDay::from_hm(12, 0).unwrap().format_12h(), "12:00 PM");
        assert_eq!(TimeOfDay::from_hm(21, 30).unwrap().format_12h(), "9:30 PM");
        assert_eq!(format_12h("07:15"), "7:15 AM");
        assert_eq!(format_12h(""), TIME_PLACEHOLDER);
        assert_eq!(format_12h("soon"), TIME_PLACEHOLDER);
    }

    #[test]
    fn serializes_as_zero_padded_text() {
        let time = TimeOfDay::from_hm(6, 0).unwrap();
        assert_eq!(serde_json::to_string(&time).unwrap(), "\"06:00\"");
        let parsed: TimeOfDay = serde_json::from_str("\"6:00\"").unwrap();
        assert_eq!(parsed, time);
        assert!(serde_json::from_str::<TimeOfDay>("\"6\"").is_err());
    }

    #[test]
    fn out_of_range_minutes_are_rejected() {
        assert_eq!(TimeOfDay::from_minutes(1440), Err(TimeError::OutOfRange(1440)));
        assert!(TimeOfDay::from_hm(24, 0).is_err());
    }
}
