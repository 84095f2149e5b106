//! Daily reminder schedule and the tolerance window matching rule.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: u32 = 60;

/// One daily trigger point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    pub hour: u8,
    pub minute: u8,
    pub label: String,
}

impl ReminderTime {
    pub fn new(hour: u8, minute: u8, label: impl Into<String>) -> Self {
        Self {
            hour,
            minute,
            label: label.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.hour < 24 && self.minute < 60
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.hour) * MINUTES_PER_HOUR + u32::from(self.minute)
    }

    /// Whether `now` (minutes since midnight) lies in `[start, start + window)`.
    /// Windows are not wrapped past midnight.
    pub fn window_contains(&self, now: u32, window_minutes: u32) -> bool {
        let start = self.minutes_since_midnight();
        now >= start && now < start.saturating_add(window_minutes)
    }
}

/// Ordered reminder entries sharing one trailing tolerance window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSchedule {
    entries: Vec<ReminderTime>,
    window_minutes: u32,
}

impl ReminderSchedule {
    pub fn new(entries: Vec<ReminderTime>, window_minutes: u32) -> Self {
        Self {
            entries,
            window_minutes,
        }
    }

    pub fn entries(&self) -> &[ReminderTime] {
        &self.entries
    }

    pub fn window_minutes(&self) -> u32 {
        self.window_minutes
    }

    /// First entry, in configured order, whose window contains `now`.
    /// At most one reminder is due per wake even if windows overlap.
    pub fn due_at(&self, now: NaiveTime) -> Option<&ReminderTime> {
        let minutes = now.hour() * MINUTES_PER_HOUR + now.minute();
        self.entries
            .iter()
            .find(|entry| entry.window_contains(minutes, self.window_minutes))
    }
}
