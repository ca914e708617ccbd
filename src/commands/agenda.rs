use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use daybook_core::recurrence::{Occurrence, expand_events};
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::horizon;
use crate::render::{Render, display_date, format_date_label};

#[derive(Debug, Serialize)]
struct AgendaRow<'a> {
    id: i64,
    title: &'a str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    all_day: bool,
    category: &'a str,
    color: &'a str,
    recurring: bool,
}

impl<'a> From<&Occurrence<'a>> for AgendaRow<'a> {
    fn from(occ: &Occurrence<'a>) -> Self {
        let event = occ.source();
        AgendaRow {
            id: occ.source_id,
            title: &event.title,
            start: occ.start,
            end: occ.end,
            all_day: event.all_day,
            category: &event.category,
            color: &event.color,
            recurring: event.recurrence_rule().is_some(),
        }
    }
}

pub fn run(store: &impl EventStore, days: i64, all: bool, json: bool) -> Result<()> {
    let now = Utc::now();
    let events = store.all_events()?;

    let mut occurrences: Vec<Occurrence<'_>> = expand_events(&events, horizon(now, days))
        .into_iter()
        .filter(|occ| all || !has_ended(occ, now))
        .collect();
    occurrences.sort_by_key(|occ| occ.start);

    if json {
        let rows: Vec<AgendaRow<'_>> = occurrences.iter().map(AgendaRow::from).collect();
        let out = serde_json::to_string_pretty(&rows).context("Could not serialize agenda")?;
        println!("{}", out);
        return Ok(());
    }

    if occurrences.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    // Group occurrences by day and print
    let today = Local::now().date_naive();
    let mut current_date = None;

    for occ in &occurrences {
        let date = display_date(occ.start, occ.source().all_day);

        if current_date != Some(date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", format_date_label(date, today).bold());
            current_date = Some(date);
        }

        println!("{}", occ.render());
    }

    Ok(())
}

/// All-day occurrences last through their (inclusive) end date.
fn has_ended(occ: &Occurrence<'_>, now: DateTime<Utc>) -> bool {
    if occ.source().all_day {
        occ.end.date_naive() < now.date_naive()
    } else {
        occ.end < now
    }
}
