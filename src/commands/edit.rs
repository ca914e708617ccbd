use anyhow::Result;
use chrono::{Duration, NaiveDate};
use clap::Args;
use daybook_core::error::CalError;
use daybook_core::store::EventStore;
use daybook_core::{Event, Frequency, RecurrenceRule};
use owo_colors::OwoColorize;

use super::add::{When, parse_when, resolve_span};

/// Options left out keep their stored value. An empty string clears a text
/// field.
#[derive(Debug, Default, Args)]
pub struct EditArgs {
    pub id: i64,

    #[arg(short, long)]
    pub title: Option<String>,

    /// New start; the event keeps its length unless --end is given
    #[arg(short, long)]
    pub start: Option<String>,

    /// End as a date/time, or a duration such as "45m" or "2h"
    #[arg(short, long)]
    pub end: Option<String>,

    /// Make the event all-day
    #[arg(long)]
    pub all_day: bool,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Meeting link
    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub color: Option<String>,

    /// Minutes before start to remind; 0 removes the reminder
    #[arg(short, long)]
    pub reminder: Option<u32>,

    /// daily, weekly, monthly, yearly, or none to stop repeating
    #[arg(long)]
    pub repeat: Option<Frequency>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub interval: Option<u32>,

    /// Last date an occurrence may start on (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

pub fn run(store: &mut impl EventStore, args: EditArgs) -> Result<()> {
    let id = args.id;
    let Some(existing) = store.all_events()?.into_iter().find(|e| e.id == id) else {
        anyhow::bail!("No event with id {}. Use `daybook search` to find ids.", id);
    };

    let event = apply_edits(existing, args)?;
    let title = event.title.clone();

    match store.update(id, event) {
        Ok(()) => {}
        Err(CalError::EventNotFound(id)) => anyhow::bail!("No event with id {}", id),
        Err(e) => return Err(e.into()),
    }

    println!("{}", format!("Updated: {} (#{})", title, id).yellow());

    Ok(())
}

fn apply_edits(mut event: Event, args: EditArgs) -> Result<Event> {
    if args.start.is_some() || args.end.is_some() || args.all_day {
        let start = match &args.start {
            Some(input) => parse_when(input)?,
            None if event.all_day => When::Date(event.start.date_naive()),
            None => When::At(event.start),
        };
        let all_day = args.all_day || matches!(start, When::Date(_));

        let fallback = if all_day == event.all_day {
            event.duration()
        } else if all_day {
            Duration::zero()
        } else {
            Duration::hours(1)
        };

        let (start, end) = resolve_span(start, args.end.as_deref(), all_day, fallback)?;
        event.start = start;
        event.end = end;
        event.all_day = all_day;
    }

    event.recurrence = edit_rule(event.recurrence.take(), &args)?;
    if let Some(until) = event.recurrence.as_ref().and_then(|r| r.until) {
        if until < event.start.date_naive() {
            anyhow::bail!("--until must not be before the start date");
        }
    }

    if let Some(title) = args.title {
        event.title = title;
    }
    if let Some(description) = args.description {
        event.description = description;
    }
    if let Some(url) = args.url {
        event.zoom_link = url;
    }
    if let Some(category) = args.category {
        event.category = category;
    }
    if let Some(color) = args.color {
        event.color = color;
    }
    if let Some(reminder) = args.reminder {
        event.reminder_minutes = reminder;
    }

    Ok(event)
}

/// `--repeat none` drops the rule; --interval/--until alone adjust the
/// existing one.
fn edit_rule(
    existing: Option<RecurrenceRule>,
    args: &EditArgs,
) -> Result<Option<RecurrenceRule>> {
    let existing = existing.filter(|rule| rule.is_recurring());

    let mut rule = match (args.repeat, existing) {
        (Some(Frequency::None), _) => {
            if args.interval.is_some() || args.until.is_some() {
                anyhow::bail!("--interval and --until cannot be used with --repeat none");
            }
            return Ok(None);
        }
        (Some(frequency), Some(mut rule)) => {
            rule.frequency = frequency;
            rule
        }
        (Some(frequency), None) => RecurrenceRule::new(frequency),
        (None, Some(rule)) => rule,
        (None, None) => {
            if args.interval.is_some() || args.until.is_some() {
                anyhow::bail!("The event does not repeat; pass --repeat as well");
            }
            return Ok(None);
        }
    };

    if let Some(interval) = args.interval {
        rule.interval = interval;
    }
    if let Some(until) = args.until {
        rule.until = Some(until);
    }

    Ok(Some(rule))
}
