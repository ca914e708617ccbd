use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use daybook_core::config::DaybookConfig;
use daybook_core::ics::generate_ics_at;
use daybook_core::recurrence::expand_events;
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;

use super::horizon;
use crate::render::pluralize;

pub async fn run(
    store: &impl EventStore,
    config: &DaybookConfig,
    output: Option<PathBuf>,
) -> Result<()> {
    let now = Utc::now();
    let events = store.all_events()?;

    // Occurrences collapse back to one VEVENT per stored event
    let occurrences = expand_events(&events, horizon(now, config.horizon_days));
    let ics = generate_ics_at(&occurrences, now);

    let path = output.unwrap_or_else(|| default_export_path(now.date_naive()));
    tokio::fs::write(&path, ics)
        .await
        .with_context(|| format!("Could not write {}", path.display()))?;

    println!(
        "{}",
        format!(
            "Exported {} {} to {}",
            events.len(),
            pluralize("event", events.len()),
            path.display()
        )
        .green()
    );

    Ok(())
}

fn default_export_path(today: NaiveDate) -> PathBuf {
    std::env::temp_dir().join(format!("daybook-export-{}.ics", today.format("%Y-%m-%d")))
}
