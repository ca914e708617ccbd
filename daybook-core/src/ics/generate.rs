//! ICS file generation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::event::{Event, RecurrenceRule};

/// PRODID written into every exported calendar
pub const PRODUCT_ID: &str = "-//Daybook//EN";

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
const DATE_FORMAT: &str = "%Y%m%d";

/// Escape a TEXT value. Backslashes go first so the escapes added for the
/// other characters are not doubled.
pub fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
        .replace('\r', "")
}

/// Generate a calendar containing one VEVENT per distinct event id.
///
/// Accepts stored events or expanded occurrences; occurrences collapse back
/// into their source event, whose own RRULE is written.
pub fn generate_ics<E: AsRef<Event>>(events: &[E]) -> String {
    generate_ics_at(events, Utc::now())
}

/// Like [`generate_ics`], with `now` used as DTSTAMP for events that have no
/// creation time.
pub fn generate_ics_at<E: AsRef<Event>>(events: &[E], now: DateTime<Utc>) -> String {
    let mut out = IcsWriter::default();

    out.line("BEGIN:VCALENDAR");
    out.property("VERSION", "2.0");
    out.property("PRODID", PRODUCT_ID);
    out.property("CALSCALE", "GREGORIAN");

    let mut seen = HashSet::new();
    for event in events {
        let event: &Event = event.as_ref();
        if !seen.insert(event.id) {
            continue;
        }
        write_event(&mut out, event, now);
    }

    out.line("END:VCALENDAR");
    out.finish()
}

fn write_event(out: &mut IcsWriter, event: &Event, now: DateTime<Utc>) {
    out.line("BEGIN:VEVENT");
    out.property("UID", &format!("{}@daybook", event.id));

    if event.all_day {
        let start = event.start.date_naive();
        // DTEND is exclusive for dates
        let end = event.end.date_naive();
        let end = end.succ_opt().unwrap_or(end);
        out.property("DTSTART;VALUE=DATE", &start.format(DATE_FORMAT).to_string());
        out.property("DTEND;VALUE=DATE", &end.format(DATE_FORMAT).to_string());
    } else {
        out.property("DTSTART", &event.start.format(UTC_FORMAT).to_string());
        out.property("DTEND", &event.end.format(UTC_FORMAT).to_string());
    }

    out.property("SUMMARY", &escape_text(&event.title));

    if !event.description.is_empty() {
        out.property("DESCRIPTION", &escape_text(&event.description));
    }

    // URIs are written as-is
    if !event.zoom_link.is_empty() {
        out.property("URL", &event.zoom_link);
    }

    if !event.category.is_empty() && event.category != crate::event::DEFAULT_CATEGORY {
        out.property("CATEGORIES", &escape_text(&event.category));
    }

    if event.has_reminder() {
        out.line("BEGIN:VALARM");
        out.property("TRIGGER", &format!("-PT{}M", event.reminder_minutes));
        out.property("ACTION", "DISPLAY");
        out.property("DESCRIPTION", "Reminder");
        out.line("END:VALARM");
    }

    if let Some(rrule) = event.recurrence_rule().map(build_rrule) {
        out.property("RRULE", &rrule);
    }

    let dtstamp = event.created_at.unwrap_or(now);
    out.property("DTSTAMP", &dtstamp.format(UTC_FORMAT).to_string());

    out.line("END:VEVENT");
}

fn build_rrule(rule: &RecurrenceRule) -> String {
    let freq = rule.frequency.as_ics_str().unwrap_or_default();
    let mut rrule = format!("FREQ={}", freq);

    if rule.interval > 1 {
        rrule.push_str(&format!(";INTERVAL={}", rule.interval));
    }

    if let Some(until) = rule.until {
        rrule.push_str(&format!(";UNTIL={}T000000Z", until.format(DATE_FORMAT)));
    }

    rrule
}

/// Accumulates CRLF-terminated content lines
#[derive(Default)]
struct IcsWriter {
    buf: String,
}

impl IcsWriter {
    fn line(&mut self, line: &str) {
        self.buf.push_str(line);
        self.buf.push_str("\r\n");
    }

    fn property(&mut self, name: &str, value: &str) {
        self.buf.push_str(name);
        self.buf.push(':');
        self.line(value);
    }

    fn finish(self) -> String {
        self.buf
    }
}
