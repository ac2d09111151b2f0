pub mod entry_repository;
pub mod month_repository;
pub mod settings_repository;
pub mod weight_repository;

use chrono::{DateTime, Utc};
use tracing::warn;

/// Timestamps are written as RFC 3339 by the repositories; anything else in
/// an old database degrades to "now" instead of failing the read.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(err) => {
            warn!(target: "app::db", %raw, %context, %err, "malformed timestamp, using current time");
            Utc::now()
        }
    }
}
