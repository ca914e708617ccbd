//! Recurrence expansion for display.
//!
//! Every event yields its own (base) occurrence, followed by the occurrences
//! its rule generates up to a horizon. Month and year steps clamp to the last
//! day of the target month: Jan 31 + 1 month is Feb 28 (or 29), and because
//! every step is computed from the base start, the following month is back on
//! the 31st.

use chrono::{DateTime, Days, Duration, Months, Utc};

use crate::event::{Event, Frequency};

/// Upper bound on occurrences produced for one event, base included.
pub const MAX_OCCURRENCES: usize = 365;

/// One concrete instance of an event. Never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Occurrence<'a> {
    /// Id of the event this occurrence was generated from
    pub source_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    source: &'a Event,
}

impl<'a> Occurrence<'a> {
    fn new(source: &'a Event, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Occurrence {
            source_id: source.id,
            start,
            end,
            source,
        }
    }

    pub fn source(&self) -> &'a Event {
        self.source
    }

    /// True for the occurrence at the event's own start.
    pub fn is_base(&self) -> bool {
        self.start == self.source.start
    }
}

impl AsRef<Event> for Occurrence<'_> {
    fn as_ref(&self) -> &Event {
        self.source
    }
}

/// Expand all events, keeping each event's occurrences together and in order.
pub fn expand_events(events: &[Event], horizon: DateTime<Utc>) -> Vec<Occurrence<'_>> {
    events
        .iter()
        .flat_map(|event| expand_event(event, horizon))
        .collect()
}

/// Expand one event up to `horizon` (inclusive).
///
/// Generation stops at the first candidate that starts after the horizon, or
/// whose start date is after the rule's `until` date, or that cannot be
/// represented.
pub fn expand_event(event: &Event, horizon: DateTime<Utc>) -> Vec<Occurrence<'_>> {
    let mut occurrences = vec![Occurrence::new(event, event.start, event.end)];

    let Some(rule) = event.recurrence_rule() else {
        return occurrences;
    };

    let step = rule.step();
    let duration = event.duration();

    for i in 1..MAX_OCCURRENCES as u32 {
        let Some(start) = i
            .checked_mul(step)
            .and_then(|n| advance(event.start, rule.frequency, n))
        else {
            break;
        };

        if start > horizon {
            break;
        }
        if rule.until.is_some_and(|until| start.date_naive() > until) {
            break;
        }

        let Some(end) = start.checked_add_signed(duration) else {
            break;
        };
        occurrences.push(Occurrence::new(event, start, end));
    }

    occurrences
}

/// Move `start` forward by `n` units of `frequency`, keeping the time of day.
fn advance(start: DateTime<Utc>, frequency: Frequency, n: u32) -> Option<DateTime<Utc>> {
    match frequency {
        Frequency::None => None,
        Frequency::Daily => start.checked_add_days(Days::new(u64::from(n))),
        Frequency::Weekly => start.checked_add_days(Days::new(7 * u64::from(n))),
        Frequency::Monthly => start.checked_add_months(Months::new(n)),
        Frequency::Yearly => n
            .checked_mul(12)
            .and_then(|months| start.checked_add_months(Months::new(months))),
    }
}

/// Occurrences with a reminder that start within `(now, now + within]`.
pub fn upcoming_reminders<'a>(
    occurrences: &[Occurrence<'a>],
    now: DateTime<Utc>,
    within: Duration,
) -> Vec<Occurrence<'a>> {
    let until = now.checked_add_signed(within).unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut due: Vec<Occurrence<'a>> = occurrences
        .iter()
        .filter(|occ| occ.source().has_reminder())
        .filter(|occ| occ.start > now && occ.start <= until)
        .copied()
        .collect();

    due.sort_by_key(|occ| occ.start);
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecurrenceRule;
    use chrono::{NaiveDate, TimeZone};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn recurring(start: DateTime<Utc>, rule: RecurrenceRule) -> Event {
        let mut event = Event::new("Recurring", start, start + Duration::minutes(90));
        event.id = 9;
        event.recurrence = Some(rule);
        event
    }

    fn starts(occurrences: &[Occurrence<'_>]) -> Vec<DateTime<Utc>> {
        occurrences.iter().map(|o| o.start).collect()
    }

    #[test]
    fn test_non_recurring_yields_base_only() {
        let mut event = Event::new("Once", utc(2025, 1, 1, 9, 0), utc(2025, 1, 1, 10, 0));
        event.id = 1;

        let occurrences = expand_event(&event, utc(2030, 1, 1, 0, 0));

        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].source_id, 1);
        assert_eq!(occurrences[0].start, event.start);
        assert_eq!(occurrences[0].end, event.end);
        assert!(occurrences[0].is_base());
    }

    #[test]
    fn test_none_frequency_matches_no_rule() {
        let event = recurring(
            utc(2025, 1, 1, 9, 0),
            RecurrenceRule::new(Frequency::None).with_interval(2),
        );

        assert_eq!(expand_event(&event, utc(2030, 1, 1, 0, 0)).len(), 1);
    }

    #[test]
    fn test_daily_until_horizon() {
        let start = utc(2025, 1, 1, 9, 0);
        let event = recurring(start, RecurrenceRule::new(Frequency::Daily));

        let occurrences = expand_event(&event, start + Duration::days(10));

        assert_eq!(occurrences.len(), 11);
        for pair in occurrences.windows(2) {
            assert_eq!(pair[1].start - pair[0].start, Duration::days(1));
        }
        assert!(occurrences.iter().all(|o| o.source_id == 9));
        assert!(occurrences.iter().all(|o| o.end - o.start == Duration::minutes(90)));
    }

    #[test]
    fn test_weekly_with_interval() {
        let start = utc(2025, 1, 6, 18, 30);
        let event = recurring(start, RecurrenceRule::new(Frequency::Weekly).with_interval(2));

        let occurrences = expand_event(&event, utc(2025, 2, 28, 0, 0));

        assert_eq!(
            starts(&occurrences),
            vec![
                utc(2025, 1, 6, 18, 30),
                utc(2025, 1, 20, 18, 30),
                utc(2025, 2, 3, 18, 30),
                utc(2025, 2, 17, 18, 30),
            ]
        );
    }

    #[test]
    fn test_until_equal_to_base_date_yields_base_only() {
        let start = utc(2025, 3, 3, 10, 0);
        let event = recurring(
            start,
            RecurrenceRule::new(Frequency::Weekly).with_until(start.date_naive()),
        );

        assert_eq!(expand_event(&event, utc(2026, 1, 1, 0, 0)).len(), 1);
    }

    #[test]
    fn test_until_is_inclusive_of_whole_day() {
        let start = utc(2025, 3, 1, 23, 0);
        let event = recurring(
            start,
            RecurrenceRule::new(Frequency::Daily)
                .with_until(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()),
        );

        let occurrences = expand_event(&event, utc(2026, 1, 1, 0, 0));

        assert_eq!(occurrences.len(), 4);
        assert_eq!(occurrences[3].start, utc(2025, 3, 4, 23, 0));
    }

    #[test]
    fn test_monthly_clamps_to_end_of_month() {
        let start = utc(2024, 1, 31, 8, 0);
        let event = recurring(start, RecurrenceRule::new(Frequency::Monthly));

        let occurrences = expand_event(&event, utc(2024, 4, 30, 23, 59));

        assert_eq!(
            starts(&occurrences),
            vec![
                utc(2024, 1, 31, 8, 0),
                utc(2024, 2, 29, 8, 0),
                utc(2024, 3, 31, 8, 0),
                utc(2024, 4, 30, 8, 0),
            ]
        );
    }

    #[test]
    fn test_yearly_leap_day_clamps() {
        let start = utc(2024, 2, 29, 12, 0);
        let event = recurring(start, RecurrenceRule::new(Frequency::Yearly));

        let occurrences = expand_event(&event, utc(2028, 12, 31, 0, 0));

        assert_eq!(
            starts(&occurrences),
            vec![
                utc(2024, 2, 29, 12, 0),
                utc(2025, 2, 28, 12, 0),
                utc(2026, 2, 28, 12, 0),
                utc(2027, 2, 28, 12, 0),
                utc(2028, 2, 29, 12, 0),
            ]
        );
    }

    #[test]
    fn test_expansion_is_capped() {
        let start = utc(2000, 1, 1, 0, 0);
        let event = recurring(start, RecurrenceRule::new(Frequency::Daily));

        let occurrences = expand_event(&event, utc(2100, 1, 1, 0, 0));

        assert_eq!(occurrences.len(), MAX_OCCURRENCES);
        assert_eq!(occurrences.last().unwrap().start, start + Duration::days(364));
    }

    #[test]
    fn test_horizon_before_start_keeps_base() {
        let start = utc(2025, 6, 1, 9, 0);
        let event = recurring(start, RecurrenceRule::new(Frequency::Daily));

        let occurrences = expand_event(&event, utc(2025, 1, 1, 0, 0));

        assert_eq!(starts(&occurrences), vec![start]);
    }

    #[test]
    fn test_negative_duration_is_carried_over() {
        let start = utc(2025, 1, 1, 10, 0);
        let mut event = recurring(start, RecurrenceRule::new(Frequency::Daily));
        event.end = start - Duration::hours(1);

        let occurrences = expand_event(&event, start + Duration::days(1));

        assert_eq!(occurrences[1].end, utc(2025, 1, 2, 9, 0));
    }

    #[test]
    fn test_expand_events_groups_by_source() {
        let mut a = recurring(utc(2025, 1, 1, 9, 0), RecurrenceRule::new(Frequency::Daily));
        a.id = 1;
        let mut b = Event::new("Single", utc(2024, 12, 31, 9, 0), utc(2024, 12, 31, 10, 0));
        b.id = 2;
        let events = vec![a, b];

        let occurrences = expand_events(&events, utc(2025, 1, 3, 9, 0));

        let ids: Vec<i64> = occurrences.iter().map(|o| o.source_id).collect();
        assert_eq!(ids, vec![1, 1, 1, 2]);
    }

    #[test]
    fn test_upcoming_reminders_window() {
        let now = utc(2025, 1, 1, 8, 0);
        let mut with_reminder = recurring(utc(2025, 1, 1, 8, 30), RecurrenceRule::new(Frequency::Daily));
        with_reminder.reminder_minutes = 10;
        with_reminder.id = 1;
        let mut without = Event::new("Quiet", utc(2025, 1, 1, 8, 15), utc(2025, 1, 1, 9, 0));
        without.id = 2;
        let mut past = Event::new("Past", utc(2025, 1, 1, 7, 0), utc(2025, 1, 1, 7, 30));
        past.id = 3;
        past.reminder_minutes = 5;
        let events = vec![with_reminder, without, past];

        let occurrences = expand_events(&events, now + Duration::days(3));
        let due = upcoming_reminders(&occurrences, now, Duration::minutes(60));

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].source_id, 1);
        assert_eq!(due[0].start, utc(2025, 1, 1, 8, 30));
    }

    #[test]
    fn test_upcoming_reminders_saturates_window() {
        let now = utc(2025, 1, 1, 8, 0);
        let mut far = Event::new("Far future", utc(2400, 1, 1, 8, 0), utc(2400, 1, 1, 9, 0));
        far.id = 1;
        far.reminder_minutes = 30;
        let events = vec![far];

        let occurrences = expand_events(&events, DateTime::<Utc>::MAX_UTC);
        let due = upcoming_reminders(&occurrences, now, Duration::MAX);

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].start, utc(2400, 1, 1, 8, 0));
    }
}
