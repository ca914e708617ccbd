use anyhow::Result;
use daybook_core::error::CalError;
use daybook_core::store::EventStore;
use owo_colors::OwoColorize;

pub fn run(store: &mut impl EventStore, id: i64) -> Result<()> {
    let title = store
        .all_events()?
        .into_iter()
        .find(|e| e.id == id)
        .map(|e| e.title);

    match store.delete(id) {
        Ok(()) => {}
        Err(CalError::EventNotFound(id)) => {
            anyhow::bail!("No event with id {}. Use `daybook search` to find ids.", id)
        }
        Err(e) => return Err(e.into()),
    }

    println!(
        "{}",
        format!("Deleted: {}", title.unwrap_or_else(|| format!("#{}", id))).red()
    );

    Ok(())
}
