use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use daybook_core::recurrence::{Occurrence, expand_events, upcoming_reminders};
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;

use crate::render::format_time;

pub fn run(store: &impl EventStore, within_minutes: i64) -> Result<()> {
    if within_minutes <= 0 {
        anyhow::bail!("--within must be a positive number of minutes");
    }
    let within = Duration::try_minutes(within_minutes)
        .ok_or_else(|| anyhow::anyhow!("--within is too large: {}", within_minutes))?;

    let now = Utc::now();
    let horizon = now.checked_add_signed(within).unwrap_or(DateTime::<Utc>::MAX_UTC);

    let events = store.all_events()?;
    let occurrences = expand_events(&events, horizon);
    let due = upcoming_reminders(&occurrences, now, within);

    if due.is_empty() {
        println!(
            "{}",
            format!("Nothing in the next {}", humanize(within)).dimmed()
        );
        return Ok(());
    }

    for occ in &due {
        println!("{}", render_reminder(occ, now));
    }

    Ok(())
}

fn render_reminder(occ: &Occurrence<'_>, now: DateTime<Utc>) -> String {
    let event = occ.source();
    let starts_in = format!("in {}", humanize(occ.start - now));
    let remind = format!("(remind {}m before)", event.reminder_minutes);

    format!(
        "  {} {} {} {}",
        format_time(occ.start, event.all_day),
        event.title,
        starts_in.yellow(),
        remind.dimmed()
    )
}

/// Whole minutes, e.g. "1h 5m"
fn humanize(duration: Duration) -> String {
    let minutes = duration.num_minutes().max(0) as u64;
    humantime::format_duration(std::time::Duration::from_secs(minutes * 60)).to_string()
}
