use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, Utc};
use clap::Args;
use daybook_core::store::EventStore;
use daybook_core::{Event, Frequency, RecurrenceRule};
use owo_colors::OwoColorize;

#[derive(Debug, Args)]
pub struct AddArgs {
    pub title: String,

    /// Start: "2026-03-20", "2026-03-20T15:00" (local) or RFC 3339
    #[arg(short, long)]
    pub start: String,

    /// End as a date/time, or a duration such as "45m" or "2h"
    #[arg(short, long)]
    pub end: Option<String>,

    /// Treat the event as all-day even if a time was given
    #[arg(long)]
    pub all_day: bool,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Meeting link
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    /// Display color, e.g. "#10b981"
    #[arg(long)]
    pub color: Option<String>,

    /// Minutes before start to remind
    #[arg(short, long, default_value_t = 0)]
    pub reminder: u32,

    /// daily, weekly, monthly or yearly
    #[arg(long)]
    pub repeat: Option<Frequency>,

    /// Repeat every N units
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: u32,

    /// Last date an occurrence may start on (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

pub fn run(store: &mut impl EventStore, args: AddArgs) -> Result<()> {
    let event = build_event(args)?;
    let title = event.title.clone();

    let id = store.insert(event)?;

    println!("{}", format!("Created: {} (#{})", title, id).green());

    Ok(())
}

/// A parsed --start/--end value
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) enum When {
    Date(NaiveDate),
    At(DateTime<Utc>),
}

impl When {
    pub(super) fn date(&self) -> NaiveDate {
        match self {
            When::Date(d) => *d,
            When::At(dt) => dt.date_naive(),
        }
    }

    pub(super) fn to_utc(self) -> DateTime<Utc> {
        match self {
            When::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            When::At(dt) => dt,
        }
    }
}

fn build_event(args: AddArgs) -> Result<Event> {
    let start = parse_when(&args.start)?;
    let all_day = args.all_day || matches!(start, When::Date(_));
    let fallback = if all_day {
        Duration::zero()
    } else {
        Duration::hours(1)
    };

    let (start, end) = resolve_span(start, args.end.as_deref(), all_day, fallback)?;

    let recurrence = match args.repeat {
        Some(frequency) if frequency != Frequency::None => {
            if args.until.is_some_and(|until| until < start.date_naive()) {
                anyhow::bail!("--until must not be before the start date");
            }
            let mut rule = RecurrenceRule::new(frequency).with_interval(args.interval);
            rule.until = args.until;
            Some(rule)
        }
        _ if args.interval != 1 || args.until.is_some() => {
            anyhow::bail!("--interval and --until need --repeat");
        }
        _ => None,
    };

    let mut event = Event::new(args.title, start, end);
    event.all_day = all_day;
    event.description = args.description.unwrap_or_default();
    event.zoom_link = args.url.unwrap_or_default();
    event.reminder_minutes = args.reminder;
    event.recurrence = recurrence;
    if let Some(category) = args.category {
        event.category = category;
    }
    if let Some(color) = args.color {
        event.color = color;
    }

    Ok(event)
}

/// Parse "YYYY-MM-DD", a local "YYYY-MM-DDTHH:MM" or an RFC 3339 timestamp.
pub(super) fn parse_when(input: &str) -> Result<When> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(When::At(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            let local = naive
                .and_local_timezone(Local)
                .earliest()
                .with_context(|| format!("\"{}\" does not exist in the local timezone", input))?;
            return Ok(When::At(local.with_timezone(&Utc)));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(When::Date(date));
    }

    anyhow::bail!(
        "Could not parse date/time: \"{}\" (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)",
        input
    )
}

/// Start and end of an event. Without `end`, the event lasts `fallback`
/// (whole days for all-day events, whose end is the last day).
pub(super) fn resolve_span(
    start: When,
    end: Option<&str>,
    all_day: bool,
    fallback: Duration,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = if all_day {
        let first = start.date();
        let last = match end {
            Some(input) => last_day(first, input)?,
            None => first
                .checked_add_signed(fallback)
                .context("End is out of range")?,
        };
        (When::Date(first).to_utc(), When::Date(last).to_utc())
    } else {
        let start = start.to_utc();
        let end = match end {
            Some(input) => parse_end(start, input)?,
            None => start
                .checked_add_signed(fallback)
                .context("End is out of range")?,
        };
        (start, end)
    };

    if end < start {
        anyhow::bail!("End must not be before start");
    }

    Ok((start, end))
}

/// End of a timed event: a duration first, then a date/time.
fn parse_end(start: DateTime<Utc>, input: &str) -> Result<DateTime<Utc>> {
    if let Ok(duration) = parse_duration(input) {
        return start
            .checked_add_signed(duration)
            .context("End is out of range");
    }

    Ok(parse_when(input)?.to_utc())
}

/// Last (inclusive) day of an all-day event. A duration of "2days" covers
/// the start day and the next one.
fn last_day(first: NaiveDate, input: &str) -> Result<NaiveDate> {
    if let Ok(duration) = parse_duration(input) {
        let days = duration.num_days().max(1);
        return first
            .checked_add_signed(Duration::days(days - 1))
            .context("End is out of range");
    }

    Ok(parse_when(input)?.date())
}

fn parse_duration(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input).map_err(|e| anyhow::anyhow!("{}", e))?;
    Duration::from_std(std_dur).context("Duration too large")
}
