//! Lenient line-oriented ICS decoding.
//!
//! Only the VEVENT properties daybook stores are read. Anything malformed is
//! skipped and reported as a [`ParseIssue`] next to the drafts that did decode.

use std::io::BufRead;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;
use tracing::{debug, trace};

use crate::error::CalResult;
use crate::event::{EventDraft, Frequency, RecurrenceRule};

/// A fragment of the input that was skipped while decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseIssue {
    #[error("line {line}: could not parse {property} value '{value}'")]
    InvalidDate {
        line: usize,
        property: &'static str,
        value: String,
    },

    #[error("line {line}: unsupported recurrence frequency '{value}'")]
    UnknownFrequency { line: usize, value: String },

    #[error("line {line}: recurrence rule has no FREQ and was dropped")]
    MissingFrequency { line: usize },

    #[error("line {line}: URL '{value}' is not a meeting link and was dropped")]
    DiscardedUrl { line: usize, value: String },

    #[error("line {line}: VEVENT opened here was never closed")]
    UnterminatedEvent { line: usize },
}

/// Result of decoding an ICS document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub drafts: Vec<EventDraft>,
    pub issues: Vec<ParseIssue>,
}

/// A date or date-time value as written in an ICS property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcsTime {
    /// `YYYYMMDDThhmmssZ`
    Utc(DateTime<Utc>),
    /// `YYYYMMDDThhmmss`, no zone information
    Floating(NaiveDateTime),
    /// `YYYYMMDD`
    Date(NaiveDate),
}

impl IcsTime {
    /// Parse a value, trying UTC, then floating, then date-only.
    pub fn parse(value: &str) -> Option<Self> {
        if !has_fixed_width_shape(value) {
            return None;
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
            return Some(IcsTime::Utc(dt.and_utc()));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S") {
            return Some(IcsTime::Floating(dt));
        }
        NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(IcsTime::Date)
    }

    /// Floating times are read as UTC; dates become midnight UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            IcsTime::Utc(dt) => *dt,
            IcsTime::Floating(dt) => dt.and_utc(),
            IcsTime::Date(d) => d.and_time(NaiveTime::default()).and_utc(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            IcsTime::Utc(dt) => dt.date_naive(),
            IcsTime::Floating(dt) => dt.date(),
            IcsTime::Date(d) => *d,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, IcsTime::Date(_))
    }
}

/// `YYYYMMDD`, `YYYYMMDDThhmmss` or `YYYYMMDDThhmmssZ` with ASCII digits.
///
/// chrono accepts single-digit fields and leading spaces, so the layout is
/// checked before any field is parsed.
fn has_fixed_width_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    let digits = |range: std::ops::Range<usize>| bytes[range].iter().all(u8::is_ascii_digit);

    match bytes.len() {
        8 => digits(0..8),
        15 => digits(0..8) && bytes[8] == b'T' && digits(9..15),
        16 => digits(0..8) && bytes[8] == b'T' && digits(9..15) && bytes[15] == b'Z',
        _ => false,
    }
}

/// The VEVENT properties the decoder acts on
#[derive(Debug, Clone, PartialEq, Eq)]
enum Property<'a> {
    Summary,
    DtStart,
    DtEnd,
    Description,
    Url,
    RRule,
    Unrecognized(&'a str),
}

impl<'a> Property<'a> {
    /// Parameters are only stripped from DTSTART and DTEND. Any other key with
    /// parameters stays as written and falls through to `Unrecognized`.
    fn from_key(key: &'a str) -> Self {
        let name = match key.split_once(';') {
            Some((base, _)) if base == "DTSTART" || base == "DTEND" => base,
            _ => key,
        };

        match name {
            "SUMMARY" => Property::Summary,
            "DTSTART" => Property::DtStart,
            "DTEND" => Property::DtEnd,
            "DESCRIPTION" => Property::Description,
            "URL" => Property::Url,
            "RRULE" => Property::RRule,
            _ => Property::Unrecognized(key),
        }
    }
}

/// Decode an in-memory ICS document. Never fails.
pub fn decode(text: &str) -> Decoded {
    let mut decoder = Decoder::default();
    for (idx, line) in text.lines().enumerate() {
        decoder.feed(idx + 1, line);
    }
    decoder.finish()
}

/// Decode from a reader. Only read errors (including invalid UTF-8) fail.
pub fn decode_reader<R: BufRead>(reader: R) -> CalResult<Decoded> {
    let mut decoder = Decoder::default();
    for (idx, line) in reader.lines().enumerate() {
        decoder.feed(idx + 1, &line?);
    }
    Ok(decoder.finish())
}

/// Split a content line at the first colon. A line without one is all key.
fn split_line(line: &str) -> (&str, &str) {
    line.split_once(':').unwrap_or((line, ""))
}

fn parse_date_property(
    line: usize,
    property: &'static str,
    value: &str,
) -> Result<IcsTime, ParseIssue> {
    IcsTime::parse(value).ok_or_else(|| ParseIssue::InvalidDate {
        line,
        property,
        value: value.to_string(),
    })
}

fn parse_url(line: usize, value: &str) -> Result<String, ParseIssue> {
    if value.contains("zoom") {
        Ok(value.to_string())
    } else {
        Err(ParseIssue::DiscardedUrl {
            line,
            value: value.to_string(),
        })
    }
}

/// Accumulate every digit in the value; other characters are skipped.
fn parse_interval(value: &str) -> u32 {
    value
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |n, d| n.saturating_mul(10).saturating_add(d))
}

fn unescape_description(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// An event being decoded
struct Pending {
    draft: EventDraft,
    rule: Option<RecurrenceRule>,
    opened_at: usize,
    rrule_line: usize,
    saw_freq: bool,
}

impl Pending {
    fn new(opened_at: usize) -> Self {
        Pending {
            draft: EventDraft::default(),
            rule: None,
            opened_at,
            rrule_line: 0,
            saw_freq: false,
        }
    }
}

#[derive(Default)]
struct Decoder {
    decoded: Decoded,
    current: Option<Pending>,
}

impl Decoder {
    fn report(&mut self, issue: ParseIssue) {
        debug!(%issue, "skipping malformed ICS content");
        self.decoded.issues.push(issue);
    }

    fn feed(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim();

        if line == "BEGIN:VEVENT" {
            if let Some(abandoned) = self.current.replace(Pending::new(line_no)) {
                self.report(ParseIssue::UnterminatedEvent {
                    line: abandoned.opened_at,
                });
            }
            return;
        }

        if line == "END:VEVENT" {
            if let Some(pending) = self.current.take() {
                self.complete(pending);
            }
            return;
        }

        // Nested components (VALARM etc.) are not tracked; their lines apply
        // to the enclosing event like any other.
        let Some(mut pending) = self.current.take() else {
            return;
        };

        let (key, value) = split_line(line);
        self.apply(&mut pending, line_no, key, value);

        self.current = Some(pending);
    }

    fn apply(&mut self, pending: &mut Pending, line_no: usize, key: &str, value: &str) {
        match Property::from_key(key) {
            Property::Summary => pending.draft.title = value.to_string(),
            Property::DtStart => match parse_date_property(line_no, "DTSTART", value) {
                Ok(time) => {
                    pending.draft.start = time.to_utc();
                    pending.draft.start_is_date = time.is_date();
                }
                Err(issue) => self.report(issue),
            },
            Property::DtEnd => match parse_date_property(line_no, "DTEND", value) {
                Ok(time) => {
                    pending.draft.end = time.to_utc();
                    pending.draft.end_is_date = time.is_date();
                }
                Err(issue) => self.report(issue),
            },
            Property::Description => pending.draft.description = unescape_description(value),
            Property::Url => match parse_url(line_no, value) {
                Ok(url) => pending.draft.zoom_link = url,
                Err(issue) => self.report(issue),
            },
            Property::RRule => self.apply_rrule(pending, line_no, value),
            Property::Unrecognized(name) => {
                trace!(line = line_no, property = name, "ignoring ICS property");
            }
        }
    }

    /// Merge an RRULE value into the pending event's rule.
    fn apply_rrule(&mut self, pending: &mut Pending, line_no: usize, value: &str) {
        pending.rrule_line = line_no;
        let rule = pending.rule.get_or_insert_with(RecurrenceRule::default);
        let mut issues = Vec::new();

        for part in value.split(';') {
            let Some((key, val)) = part.split_once('=') else {
                continue;
            };

            match key {
                "FREQ" => {
                    pending.saw_freq = true;
                    match Frequency::from_ics_str(val) {
                        Some(frequency) => rule.frequency = frequency,
                        None => issues.push(ParseIssue::UnknownFrequency {
                            line: line_no,
                            value: val.to_string(),
                        }),
                    }
                }
                "INTERVAL" => {
                    let interval = parse_interval(val);
                    if interval > 0 {
                        rule.interval = interval;
                    }
                }
                "UNTIL" => match parse_date_property(line_no, "UNTIL", val) {
                    Ok(time) => rule.until = Some(time.date()),
                    Err(issue) => issues.push(issue),
                },
                _ => {}
            }
        }

        for issue in issues {
            self.report(issue);
        }
    }

    fn complete(&mut self, pending: Pending) {
        let Pending {
            mut draft,
            rule,
            rrule_line,
            saw_freq,
            ..
        } = pending;

        match rule {
            Some(rule) if rule.is_recurring() => draft.recurrence = Some(rule),
            Some(_) if !saw_freq => {
                self.report(ParseIssue::MissingFrequency { line: rrule_line });
            }
            _ => {}
        }

        self.decoded.drafts.push(draft);
    }

    fn finish(mut self) -> Decoded {
        if let Some(pending) = self.current.take() {
            self.report(ParseIssue::UnterminatedEvent {
                line: pending.opened_at,
            });
        }
        self.decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn single(ics: &str) -> EventDraft {
        let decoded = decode(ics);
        assert_eq!(decoded.drafts.len(), 1, "Expected one draft, got {:?}", decoded);
        decoded.drafts.into_iter().next().unwrap()
    }

    #[test]
    fn test_decode_basic_event() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
SUMMARY:Team sync\r\n\
DTSTART:20250320T150000Z\r\n\
DTEND:20250320T160000Z\r\n\
DESCRIPTION:Agenda\\nNotes\r\n\
URL:https://zoom.us/j/123\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let draft = single(ics);

        assert_eq!(draft.title, "Team sync");
        assert_eq!(draft.start, Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap());
        assert_eq!(draft.end, Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap());
        assert_eq!(draft.description, "Agenda\nNotes");
        assert_eq!(draft.zoom_link, "https://zoom.us/j/123");
        assert!(draft.recurrence.is_none());
        assert!(!draft.is_all_day());
    }

    #[test]
    fn test_invalid_date_is_skipped_not_fatal() {
        let decoded = decode("BEGIN:VEVENT\nSUMMARY:X\nDTSTART:not-a-date\nEND:VEVENT\n");

        assert_eq!(decoded.drafts.len(), 1);
        assert_eq!(decoded.drafts[0].title, "X");
        assert_eq!(decoded.drafts[0].start, DateTime::<Utc>::default());
        assert_eq!(
            decoded.issues,
            vec![ParseIssue::InvalidDate {
                line: 3,
                property: "DTSTART",
                value: "not-a-date".to_string(),
            }]
        );
    }

    #[test]
    fn test_date_grammar_priority() {
        assert_eq!(
            IcsTime::parse("20250101T100000Z"),
            Some(IcsTime::Utc(Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()))
        );
        assert_eq!(
            IcsTime::parse("20250101T100000"),
            Some(IcsTime::Floating(
                NaiveDate::from_ymd_opt(2025, 1, 1)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
            ))
        );
        assert_eq!(
            IcsTime::parse("20250101"),
            Some(IcsTime::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()))
        );
        assert_eq!(IcsTime::parse("2025-01-01"), None);
        assert_eq!(IcsTime::parse("20250101T1000"), None);
    }

    #[test]
    fn test_date_grammar_is_fixed_width() {
        assert_eq!(IcsTime::parse("2025111"), None);
        assert_eq!(IcsTime::parse(" 20250101"), None);
        assert_eq!(IcsTime::parse("2025011T090000Z"), None);
        assert_eq!(IcsTime::parse("20250101T090000X"), None);
        assert_eq!(IcsTime::parse("2025010aT090000"), None);
    }

    #[test]
    fn test_short_dtstart_leaves_start_unchanged() {
        let decoded = decode("BEGIN:VEVENT\nDTSTART:20250601\nDTSTART:2025111\nEND:VEVENT\n");

        assert_eq!(
            decoded.drafts[0].start,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
        );
        assert!(matches!(
            decoded.issues.as_slice(),
            [ParseIssue::InvalidDate { line: 3, property: "DTSTART", .. }]
        ));
    }

    #[test]
    fn test_dtstart_parameters_are_stripped() {
        let draft = single(
            "BEGIN:VEVENT\n\
DTSTART;VALUE=DATE:20250601\n\
DTEND;TZID=Europe/Berlin:20250601T120000\n\
END:VEVENT\n",
        );

        assert_eq!(draft.start, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        assert!(draft.start_is_date);
        assert_eq!(draft.end, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
        assert!(!draft.end_is_date);
    }

    #[test]
    fn test_other_parameterized_keys_are_ignored() {
        let draft = single(
            "BEGIN:VEVENT\n\
SUMMARY;LANGUAGE=en:Localized\n\
DESCRIPTION;ALTREP=\"cid:x\":Alt\n\
END:VEVENT\n",
        );

        assert_eq!(draft.title, "");
        assert_eq!(draft.description, "");
    }

    #[test]
    fn test_non_zoom_url_is_discarded() {
        let decoded = decode("BEGIN:VEVENT\nURL:https://meet.example.com/abc\nEND:VEVENT\n");

        assert_eq!(decoded.drafts[0].zoom_link, "");
        assert!(matches!(
            decoded.issues.as_slice(),
            [ParseIssue::DiscardedUrl { line: 2, .. }]
        ));
    }

    #[test]
    fn test_zoom_match_is_case_sensitive() {
        let draft = single("BEGIN:VEVENT\nURL:https://Zoom.us/j/1\nEND:VEVENT\n");
        assert_eq!(draft.zoom_link, "");
    }

    #[test]
    fn test_rrule_parsing() {
        let draft = single(
            "BEGIN:VEVENT\n\
DTSTART:20250106T090000Z\n\
RRULE:FREQ=WEEKLY;INTERVAL=2;UNTIL=20250331T235959Z;BYDAY=MO\n\
END:VEVENT\n",
        );

        let rule = draft.recurrence.expect("Should have recurrence");
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(rule.interval, 2);
        assert_eq!(rule.until, NaiveDate::from_ymd_opt(2025, 3, 31));
    }

    #[test]
    fn test_rrule_interval_skips_non_digits() {
        assert_eq!(parse_interval("3"), 3);
        assert_eq!(parse_interval("1x2"), 12);
        assert_eq!(parse_interval("abc"), 0);
        assert_eq!(parse_interval("99999999999"), u32::MAX);

        let draft = single("BEGIN:VEVENT\nRRULE:FREQ=DAILY;INTERVAL=0\nEND:VEVENT\n");
        assert_eq!(draft.recurrence.map(|r| r.interval), Some(1));
    }

    #[test]
    fn test_rrule_unknown_frequency_drops_rule() {
        let decoded = decode("BEGIN:VEVENT\nRRULE:FREQ=HOURLY;INTERVAL=2\nEND:VEVENT\n");

        assert!(decoded.drafts[0].recurrence.is_none());
        assert_eq!(
            decoded.issues,
            vec![ParseIssue::UnknownFrequency {
                line: 2,
                value: "HOURLY".to_string(),
            }]
        );
    }

    #[test]
    fn test_rrule_without_freq_is_reported() {
        let decoded = decode("BEGIN:VEVENT\nRRULE:INTERVAL=2\nEND:VEVENT\n");

        assert!(decoded.drafts[0].recurrence.is_none());
        assert_eq!(decoded.issues, vec![ParseIssue::MissingFrequency { line: 2 }]);
    }

    #[test]
    fn test_unterminated_event_yields_nothing() {
        let decoded = decode(
            "BEGIN:VEVENT\nSUMMARY:First\nEND:VEVENT\nBEGIN:VEVENT\nSUMMARY:Second\n",
        );

        assert_eq!(decoded.drafts.len(), 1);
        assert_eq!(decoded.drafts[0].title, "First");
        assert_eq!(decoded.issues, vec![ParseIssue::UnterminatedEvent { line: 4 }]);
    }

    #[test]
    fn test_lines_outside_vevent_are_ignored() {
        let decoded = decode("SUMMARY:Stray\nEND:VEVENT\nBEGIN:VEVENT\nEND:VEVENT\n");

        assert_eq!(decoded.drafts.len(), 1);
        assert_eq!(decoded.drafts[0].title, "");
        assert!(decoded.issues.is_empty());
    }

    #[test]
    fn test_alarm_lines_apply_to_enclosing_event() {
        let draft = single(
            "BEGIN:VEVENT\n\
SUMMARY:Base\n\
BEGIN:VALARM\n\
SUMMARY:Alarm\n\
DESCRIPTION:Reminder\n\
END:VALARM\n\
END:VEVENT\n",
        );

        assert_eq!(draft.title, "Alarm");
        assert_eq!(draft.description, "Reminder");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let draft = single("  BEGIN:VEVENT  \r\n\tSUMMARY:Padded \r\n END:VEVENT\r\n");
        assert_eq!(draft.title, "Padded");
    }

    #[test]
    fn test_decode_reader_rejects_invalid_utf8() {
        let bytes: &[u8] = b"BEGIN:VEVENT\nSUMMARY:\xff\xfe\nEND:VEVENT\n";
        let result = decode_reader(bytes);

        assert!(matches!(result, Err(crate::error::CalError::Io(_))));
    }

    #[test]
    fn test_decode_reader_matches_decode() {
        let ics = "BEGIN:VEVENT\nSUMMARY:Reader\nDTSTART:20250101\nEND:VEVENT\n";
        let from_reader = decode_reader(ics.as_bytes()).unwrap();

        assert_eq!(from_reader, decode(ics));
    }
}
