use std::path::Path;

use anyhow::{Context, Result};
use daybook_core::ics::{self, Decoded};
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;

use crate::render::pluralize;

pub async fn run(store: &mut impl EventStore, file: &Path) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Could not read {}", file.display()))?;

    let Decoded { drafts, issues } = ics::decode_reader(bytes.as_slice())
        .with_context(|| format!("{} is not a UTF-8 text file", file.display()))?;

    if !issues.is_empty() {
        eprintln!(
            "{}",
            format!("Skipped {} {}:", issues.len(), pluralize("value", issues.len())).yellow()
        );
        for issue in &issues {
            eprintln!("  {}", issue.to_string().dimmed());
        }
    }

    if drafts.is_empty() {
        println!("{}", format!("No events found in {}", file.display()).dimmed());
        return Ok(());
    }

    let ids = store.insert_drafts(drafts)?;

    println!(
        "{}",
        format!(
            "Imported {} {} from {}",
            ids.len(),
            pluralize("event", ids.len()),
            file.display()
        )
        .green()
    );

    Ok(())
}
