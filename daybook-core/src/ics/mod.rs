//! ICS import and export.
//!
//! This module reads and writes the subset of RFC 5545 daybook uses: VEVENTs
//! with a summary, start/end, description, meeting URL, category, a display
//! alarm and a simple RRULE.

mod generate;
mod parse;

pub use generate::{PRODUCT_ID, escape_text, generate_ics, generate_ics_at};
pub use parse::{Decoded, IcsTime, ParseIssue, decode, decode_reader};
