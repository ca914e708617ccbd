pub mod add;
pub mod agenda;
pub mod config;
pub mod delete;
pub mod edit;
pub mod export;
pub mod import;
pub mod reminders;
pub mod search;

use chrono::{DateTime, Duration, Utc};

/// `now` plus `days`, saturating at the latest representable time.
pub fn horizon(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
