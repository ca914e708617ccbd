use anyhow::Result;
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;

use crate::render::{Render, pluralize};

pub fn run(store: &impl EventStore, query: &str) -> Result<()> {
    let matches = store.search(query)?;

    if matches.is_empty() {
        println!("{}", format!("No events matching \"{}\"", query).dimmed());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} {}", matches.len(), pluralize("event", matches.len())).bold()
    );
    for event in &matches {
        println!("{}", event.render());
    }

    Ok(())
}
