//! Core library for daybook.
//!
//! - `ics` decodes foreign `.ics` files into drafts and encodes stored events
//! - `recurrence` expands recurring events into occurrences for display
//! - `store` and `config` are the storage and settings the CLI builds on

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod recurrence;
pub mod store;

// Re-export all event types at crate root for convenience
pub use event::*;
