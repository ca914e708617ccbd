//! Event types shared by the codec, the expander and the store.
//!
//! `Event` is what the store hands out. `EventDraft` is what the ICS decoder
//! produces before the store has assigned an id.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Category assigned when none is given. Never exported as CATEGORIES.
pub const DEFAULT_CATEGORY: &str = "default";

/// Display color assigned when none is given.
pub const DEFAULT_COLOR: &str = "#3b82f6";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_interval() -> u32 {
    1
}

/// A stored calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Assigned by the store on first save, 0 until then
    pub id: i64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Start and end only carry a date; `end` is the last day (inclusive)
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub zoom_link: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Minutes before start to remind; 0 disables the reminder
    #[serde(default)]
    pub reminder_minutes: u32,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
    /// Set by the store; used as DTSTAMP on export
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Event {
            id: 0,
            title: title.into(),
            start,
            end,
            all_day: false,
            description: String::new(),
            zoom_link: String::new(),
            category: default_category(),
            color: default_color(),
            reminder_minutes: 0,
            recurrence: None,
            created_at: None,
        }
    }

    /// The recurrence rule, if there is one that actually repeats.
    ///
    /// A rule with `Frequency::None` behaves exactly like no rule.
    pub fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        self.recurrence.as_ref().filter(|r| r.is_recurring())
    }

    /// Length of the event. Negative when the stored end precedes the start.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn has_reminder(&self) -> bool {
        self.reminder_minutes > 0
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

/// How often a recurring event repeats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Parse an RRULE `FREQ` value. Only the four supported frequencies match.
    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s {
            "DAILY" => Some(Frequency::Daily),
            "WEEKLY" => Some(Frequency::Weekly),
            "MONTHLY" => Some(Frequency::Monthly),
            "YEARLY" => Some(Frequency::Yearly),
            _ => None,
        }
    }

    /// The RRULE `FREQ` value, or `None` for a non-repeating frequency.
    pub fn as_ics_str(&self) -> Option<&'static str> {
        match self {
            Frequency::None => None,
            Frequency::Daily => Some("DAILY"),
            Frequency::Weekly => Some("WEEKLY"),
            Frequency::Monthly => Some("MONTHLY"),
            Frequency::Yearly => Some("YEARLY"),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Frequency::None => "none",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Frequency::None),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(format!(
                "Unknown frequency '{}'. Expected daily, weekly, monthly, yearly or none",
                other
            )),
        }
    }
}

/// Recurrence rule embedded in an event (the RRULE subset daybook supports)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// Last date an occurrence may start on (inclusive)
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        RecurrenceRule {
            frequency: Frequency::None,
            interval: default_interval(),
            until: None,
        }
    }
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency,
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_until(mut self, until: NaiveDate) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.frequency != Frequency::None
    }

    /// Interval normalized to at least 1.
    pub fn step(&self) -> u32 {
        self.interval.max(1)
    }
}

/// An event decoded from ICS that has not been stored yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// DTSTART used the date-only form
    pub start_is_date: bool,
    /// DTEND used the date-only form
    pub end_is_date: bool,
    pub description: String,
    pub zoom_link: String,
    pub recurrence: Option<RecurrenceRule>,
}

impl EventDraft {
    /// Both boundaries were date-only values.
    pub fn is_all_day(&self) -> bool {
        self.start_is_date && self.end_is_date
    }

    /// Turn the draft into a stored event.
    ///
    /// All-day drafts carry the ICS exclusive end date; it is pulled back one
    /// day so the stored end is the last day of the event.
    pub fn into_event(self, id: i64, created_at: DateTime<Utc>) -> Event {
        let all_day = self.is_all_day();
        let end = if all_day && self.end > self.start {
            self.end - Duration::days(1)
        } else {
            self.end
        };

        Event {
            id,
            title: self.title,
            start: self.start,
            end,
            all_day,
            description: self.description,
            zoom_link: self.zoom_link,
            category: default_category(),
            color: default_color(),
            reminder_minutes: 0,
            recurrence: self.recurrence,
            created_at: Some(created_at),
        }
    }
}
