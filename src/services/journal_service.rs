use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::repositories::month_repository::MonthRepository;
use crate::db::repositories::weight_repository::WeightRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::entry::DailyEntry;
use crate::models::month::{MonthKey, MonthMeta, MonthlyAggregate};
use crate::services::settings_service::SettingsService;

/// Daily-entry and monthly-aggregate lifecycle: months are created lazily
/// with one pre-seeded empty entry per day, and cell edits land here as
/// discrete (date, activity id, hours) events.
pub struct JournalService {
    db: DbPool,
    settings: Arc<SettingsService>,
}

impl JournalService {
    pub fn new(db: DbPool, settings: Arc<SettingsService>) -> Self {
        Self { db, settings }
    }

    /// Load a month, creating it (with empty entries for every day) on
    /// first access.
    pub fn open_month(&self, key: MonthKey) -> AppResult<MonthlyAggregate> {
        let config = self.settings.config()?;

        self.db.with_connection(|conn| {
            ensure_month(conn, key, &config)?;
            let meta = MonthRepository::find_by_key(conn, key)?.ok_or(AppError::NotFound)?;
            let entries = EntryRepository::list_month(conn, key)?;
            Ok(MonthlyAggregate { meta, entries })
        })
    }

    /// Record logged hours for one activity on one day. Zero hours clears
    /// the cell. The UI steps in 0.5h increments, but any non-negative
    /// decimal is accepted here.
    pub fn record_hours(
        &self,
        date: NaiveDate,
        activity_id: &str,
        hours: f64,
    ) -> AppResult<DailyEntry> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(AppError::validation(format!(
                "logged hours must be a non-negative finite number, got {hours}"
            )));
        }

        let config = self.settings.config()?;

        self.db.with_connection(|conn| {
            if WeightRepository::find_by_id(conn, activity_id)?.is_none() {
                return Err(AppError::validation(format!(
                    "unknown activity id: {activity_id}"
                )));
            }

            ensure_month(conn, MonthKey::from_date(date), &config)?;

            let mut entry = EntryRepository::find_by_date(conn, date)?
                .unwrap_or_else(|| DailyEntry::empty(date));
            if hours == 0.0 {
                entry.activities.remove(activity_id);
            } else {
                entry.activities.insert(activity_id.to_string(), hours);
            }
            entry.updated_at = Utc::now();

            EntryRepository::upsert(conn, &entry)?;
            MonthRepository::touch(conn, MonthKey::from_date(date))?;
            Ok(entry)
        })
    }

    /// Wake/sleep hours as decimals in [0, 24). These are history-view
    /// data only and never enter the score.
    pub fn set_sleep_schedule(
        &self,
        date: NaiveDate,
        wake_time: Option<f64>,
        sleep_time: Option<f64>,
    ) -> AppResult<DailyEntry> {
        for (field, value) in [("wake_time", wake_time), ("sleep_time", sleep_time)] {
            if let Some(hour) = value {
                if !hour.is_finite() || !(0.0..24.0).contains(&hour) {
                    return Err(AppError::validation(format!(
                        "{field} must be an hour of day in [0, 24), got {hour}"
                    )));
                }
            }
        }

        self.mutate_entry(date, |entry| {
            entry.wake_time = wake_time;
            entry.sleep_time = sleep_time;
        })
    }

    pub fn set_bonus(&self, date: NaiveDate, bonus: Option<f64>) -> AppResult<DailyEntry> {
        if let Some(value) = bonus {
            if !value.is_finite() {
                return Err(AppError::validation(format!(
                    "bonus must be a finite number, got {value}"
                )));
            }
        }

        self.mutate_entry(date, |entry| entry.bonus = bonus)
    }

    pub fn set_notes(&self, date: NaiveDate, notes: Option<String>) -> AppResult<DailyEntry> {
        let notes = notes
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self.mutate_entry(date, move |entry| entry.notes = notes)
    }

    pub fn entry(&self, date: NaiveDate) -> AppResult<Option<DailyEntry>> {
        self.db
            .with_connection(|conn| EntryRepository::find_by_date(conn, date))
    }

    fn mutate_entry<F>(&self, date: NaiveDate, apply: F) -> AppResult<DailyEntry>
    where
        F: FnOnce(&mut DailyEntry),
    {
        let config = self.settings.config()?;

        self.db.with_connection(|conn| {
            ensure_month(conn, MonthKey::from_date(date), &config)?;

            let mut entry = EntryRepository::find_by_date(conn, date)?
                .unwrap_or_else(|| DailyEntry::empty(date));
            apply(&mut entry);
            entry.updated_at = Utc::now();

            EntryRepository::upsert(conn, &entry)?;
            Ok(entry)
        })
    }
}

fn ensure_month(
    conn: &Connection,
    key: MonthKey,
    config: &crate::models::settings::TrackerConfig,
) -> AppResult<()> {
    if MonthRepository::find_by_key(conn, key)?.is_some() {
        return Ok(());
    }

    let now = Utc::now();
    MonthRepository::insert(
        conn,
        &MonthMeta {
            key,
            meta_hours: config.default_meta_hours,
            meta_points: config.default_meta_points,
            created_at: now,
            updated_at: now,
        },
    )?;
    for date in key.iter_days() {
        EntryRepository::insert_ignore(conn, &DailyEntry::empty(date))?;
    }
    info!(
        target: "app::journal",
        month = %key,
        days = key.days_in_month(),
        "monthly aggregate created"
    );
    Ok(())
}
