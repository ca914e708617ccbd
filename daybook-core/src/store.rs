//! Event storage.
//!
//! The codec and expander only need "give me every event" and "persist these
//! drafts". `JsonStore` keeps all events in one `events.json` file.

use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalError, CalResult};
use crate::event::{DEFAULT_CATEGORY, DEFAULT_COLOR, Event, EventDraft};

/// What daybook needs from a storage backend.
pub trait EventStore {
    /// All events, ordered by start.
    fn all_events(&self) -> CalResult<Vec<Event>>;

    /// Persist a new event and return its assigned id.
    ///
    /// Any id already on the event is replaced. `created_at` is stamped when
    /// missing, and empty category/color fall back to the defaults.
    fn insert(&mut self, event: Event) -> CalResult<i64>;

    /// Replace a stored event's content, keeping its id and `created_at`.
    ///
    /// Empty category/color fall back to the defaults, as on insert.
    fn update(&mut self, id: i64, event: Event) -> CalResult<()>;

    fn delete(&mut self, id: i64) -> CalResult<()>;

    /// Events whose title or description contains `query` (case-insensitive).
    fn search(&self, query: &str) -> CalResult<Vec<Event>>;

    fn insert_draft(&mut self, draft: EventDraft) -> CalResult<i64> {
        self.insert(draft.into_event(0, Utc::now()))
    }

    /// Persist decoded drafts, returning their ids in input order.
    fn insert_drafts(&mut self, drafts: Vec<EventDraft>) -> CalResult<Vec<i64>> {
        drafts
            .into_iter()
            .map(|draft| self.insert_draft(draft))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreFile {
    next_id: i64,
    events: Vec<Event>,
}

impl StoreFile {
    fn next_id(&mut self) -> i64 {
        let max_existing = self.events.iter().map(|e| e.id).max().unwrap_or(0);
        let id = self.next_id.max(max_existing) + 1;
        self.next_id = id;
        id
    }

    /// Assign an id and defaults.
    fn push(&mut self, mut event: Event) -> i64 {
        event.id = self.next_id();
        if event.created_at.is_none() {
            event.created_at = Some(Utc::now());
        }
        apply_defaults(&mut event);

        let id = event.id;
        self.events.push(event);
        id
    }
}

fn apply_defaults(event: &mut Event) {
    if event.category.is_empty() {
        event.category = DEFAULT_CATEGORY.to_string();
    }
    if event.color.is_empty() {
        event.color = DEFAULT_COLOR.to_string();
    }
}

/// Events stored as pretty-printed JSON in a single file
///
/// Changes are made on a copy of the loaded data, which replaces it only once
/// the file has been written.
pub struct JsonStore {
    path: PathBuf,
    data: StoreFile,
}

impl JsonStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> CalResult<Self> {
        let path = path.into();

        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let data: StoreFile = serde_json::from_str(&content).map_err(|e| {
                CalError::Store(format!("Could not read {}: {}", path.display(), e))
            })?;
            debug!(path = %path.display(), events = data.events.len(), "loaded event store");
            data
        } else {
            StoreFile::default()
        };

        Ok(JsonStore { path, data })
    }

    pub fn get(&self, id: i64) -> Option<&Event> {
        self.data.events.iter().find(|e| e.id == id)
    }

    /// Write `data` to disk, then make it current.
    fn commit(&mut self, data: StoreFile) -> CalResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let temp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&data)?;

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;

        debug!(path = %self.path.display(), events = data.events.len(), "saved event store");
        self.data = data;
        Ok(())
    }
}

impl EventStore for JsonStore {
    fn all_events(&self) -> CalResult<Vec<Event>> {
        let mut events = self.data.events.clone();
        events.sort_by_key(|e| e.start);
        Ok(events)
    }

    fn insert(&mut self, event: Event) -> CalResult<i64> {
        let mut data = self.data.clone();
        let id = data.push(event);

        self.commit(data)?;
        Ok(id)
    }

    fn insert_drafts(&mut self, drafts: Vec<EventDraft>) -> CalResult<Vec<i64>> {
        let created_at = Utc::now();
        let mut data = self.data.clone();
        let ids = drafts
            .into_iter()
            .map(|draft| data.push(draft.into_event(0, created_at)))
            .collect();

        self.commit(data)?;
        Ok(ids)
    }

    fn update(&mut self, id: i64, mut event: Event) -> CalResult<()> {
        let mut data = self.data.clone();
        let slot = data
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CalError::EventNotFound(id))?;

        event.id = id;
        event.created_at = slot.created_at;
        apply_defaults(&mut event);
        *slot = event;

        self.commit(data)
    }

    fn delete(&mut self, id: i64) -> CalResult<()> {
        let mut data = self.data.clone();
        data.events.retain(|e| e.id != id);

        if data.events.len() == self.data.events.len() {
            return Err(CalError::EventNotFound(id));
        }

        self.commit(data)
    }

    fn search(&self, query: &str) -> CalResult<Vec<Event>> {
        let needle = query.to_lowercase();

        let mut matches: Vec<Event> = self
            .data
            .events
            .iter()
            .filter(|e| {
                e.title.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();

        matches.sort_by_key(|e| e.start);
        Ok(matches)
    }
}
