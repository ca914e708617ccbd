//! Terminal rendering for daybook types.
//!
//! Extension traits that add colored output to daybook-core types using
//! owo_colors. Timed events are shown in local time; all-day events keep
//! their stored date.

use chrono::{DateTime, Local, NaiveDate, Utc};
use daybook_core::Event;
use daybook_core::recurrence::Occurrence;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Occurrence<'_> {
    fn render(&self) -> String {
        let event = self.source();
        let time = format_time(self.start, event.all_day);

        let mut line = format!("  {} {}", time, event.title);
        if event.recurrence_rule().is_some() {
            line.push_str(&format!(" {}", "↻".dimmed()));
        }
        line.push_str(&format!(" {}", tags(event).dimmed()));
        line
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let date = display_date(self.start, self.all_day).format("%a %b %-d %Y");
        let time = format_time(self.start, self.all_day);

        format!(
            "  {} {} {} {}",
            date.to_string().bold(),
            time,
            self.title,
            tags(self).dimmed()
        )
    }
}

/// `[#id category]`, the default category is left out
fn tags(event: &Event) -> String {
    if event.category == daybook_core::DEFAULT_CATEGORY {
        format!("[#{}]", event.id)
    } else {
        format!("[#{} {}]", event.id, event.category)
    }
}

/// The calendar day an event start falls on, as the user sees it.
pub fn display_date(start: DateTime<Utc>, all_day: bool) -> NaiveDate {
    if all_day {
        start.date_naive()
    } else {
        start.with_timezone(&Local).date_naive()
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

/// Format the time portion of an event (e.g. "15:00" or "all-day")
pub fn format_time(start: DateTime<Utc>, all_day: bool) -> String {
    if all_day {
        "all-day".to_string()
    } else {
        format!("{:>7}", start.with_timezone(&Local).format("%H:%M"))
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
