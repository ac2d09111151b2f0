use std::collections::BTreeMap;
use std::convert::TryFrom;

use chrono::NaiveDate;
use rusqlite::{named_params, Connection, OptionalExtension, Row};
use tracing::warn;

use crate::db::repositories::parse_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::entry::DailyEntry;
use crate::models::month::MonthKey;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct DailyEntryRow {
    pub date: String,
    pub activities: String,
    pub wake_time: Option<f64>,
    pub sleep_time: Option<f64>,
    pub bonus: Option<f64>,
    pub notes: Option<String>,
    pub updated_at: String,
}

impl DailyEntryRow {
    pub fn from_model(entry: &DailyEntry) -> AppResult<Self> {
        Ok(Self {
            date: entry.date.format(DATE_FORMAT).to_string(),
            activities: serde_json::to_string(&entry.activities)?,
            wake_time: entry.wake_time,
            sleep_time: entry.sleep_time,
            bonus: entry.bonus,
            notes: entry.notes.clone(),
            updated_at: entry.updated_at.to_rfc3339(),
        })
    }

    pub fn into_model(self) -> AppResult<DailyEntry> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
            .map_err(|err| AppError::database(format!("bad entry date {:?}: {err}", self.date)))?;

        // Malformed hour maps degrade to "no activity" so partial history
        // still renders (streaks and aggregates treat it as zero).
        let activities: BTreeMap<String, f64> = match serde_json::from_str(&self.activities) {
            Ok(map) => map,
            Err(err) => {
                warn!(
                    target: "app::db",
                    date = %self.date,
                    %err,
                    "malformed activity map, treating day as empty"
                );
                BTreeMap::new()
            }
        };

        Ok(DailyEntry {
            date,
            activities,
            wake_time: self.wake_time,
            sleep_time: self.sleep_time,
            bonus: self.bonus,
            notes: self.notes,
            updated_at: parse_timestamp(&self.updated_at, "daily_entries.updated_at"),
        })
    }
}

impl TryFrom<&Row<'_>> for DailyEntryRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            date: row.get("date")?,
            activities: row.get("activities")?,
            wake_time: row.get("wake_time")?,
            sleep_time: row.get("sleep_time")?,
            bonus: row.get("bonus")?,
            notes: row.get("notes")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    date,
    activities,
    wake_time,
    sleep_time,
    bonus,
    notes,
    updated_at
"#;

pub struct EntryRepository;

impl EntryRepository {
    pub fn upsert(conn: &Connection, entry: &DailyEntry) -> AppResult<()> {
        let row = DailyEntryRow::from_model(entry)?;

        conn.execute(
            r#"
                INSERT INTO daily_entries (
                    date, activities, wake_time, sleep_time, bonus, notes, updated_at
                ) VALUES (
                    :date, :activities, :wake_time, :sleep_time, :bonus, :notes, :updated_at
                )
                ON CONFLICT(date) DO UPDATE SET
                    activities = excluded.activities,
                    wake_time = excluded.wake_time,
                    sleep_time = excluded.sleep_time,
                    bonus = excluded.bonus,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
            "#,
            named_params! {
                ":date": &row.date,
                ":activities": &row.activities,
                ":wake_time": &row.wake_time,
                ":sleep_time": &row.sleep_time,
                ":bonus": &row.bonus,
                ":notes": &row.notes,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    /// Insert that keeps any existing record: used when pre-creating a
    /// month's empty entries.
    pub fn insert_ignore(conn: &Connection, entry: &DailyEntry) -> AppResult<()> {
        let row = DailyEntryRow::from_model(entry)?;

        conn.execute(
            r#"
                INSERT INTO daily_entries (
                    date, activities, wake_time, sleep_time, bonus, notes, updated_at
                ) VALUES (
                    :date, :activities, :wake_time, :sleep_time, :bonus, :notes, :updated_at
                )
                ON CONFLICT(date) DO NOTHING
            "#,
            named_params! {
                ":date": &row.date,
                ":activities": &row.activities,
                ":wake_time": &row.wake_time,
                ":sleep_time": &row.sleep_time,
                ":bonus": &row.bonus,
                ":notes": &row.notes,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_date(conn: &Connection, date: NaiveDate) -> AppResult<Option<DailyEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_entries WHERE date = :date"
        ))?;

        let row = stmt
            .query_row(
                named_params! {":date": date.format(DATE_FORMAT).to_string()},
                |row| DailyEntryRow::try_from(row),
            )
            .optional()?;

        row.map(DailyEntryRow::into_model).transpose()
    }

    pub fn list_month(conn: &Connection, key: MonthKey) -> AppResult<Vec<DailyEntry>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_entries WHERE date >= :first AND date <= :last ORDER BY date ASC"
        ))?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":first": key.first_day().format(DATE_FORMAT).to_string(),
                    ":last": key.last_day().format(DATE_FORMAT).to_string(),
                },
                |row| DailyEntryRow::try_from(row),
            )?
            .map(|row| row.map_err(AppError::from).and_then(DailyEntryRow::into_model))
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// Whether any stored day references the given activity id. The map is a
    /// JSON object keyed by UUID, so a quoted-id substring match is exact
    /// enough for the soft-delete check.
    pub fn any_with_activity(conn: &Connection, activity_id: &str) -> AppResult<bool> {
        let pattern = format!("%\"{activity_id}\"%");
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM daily_entries WHERE activities LIKE :pattern LIMIT 1",
                named_params! {":pattern": pattern},
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }
}
