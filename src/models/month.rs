use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::entry::DailyEntry;

/// Year-month identity of a monthly aggregate. Renders as `"YYYY-MM"`, the
/// storage key format.
///
/// The fields stay private so every value in circulation went through
/// `new`; `first_day`/`last_day` rely on that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AppError::validation(format!(
                "invalid year/month: {year}-{month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        let (year, month) = raw
            .split_once('-')
            .ok_or_else(|| AppError::validation(format!("invalid month key: {raw}")))?;
        let year: i32 = year
            .parse()
            .map_err(|_| AppError::validation(format!("invalid month key: {raw}")))?;
        let month: u32 = month
            .parse()
            .map_err(|_| AppError::validation(format!("invalid month key: {raw}")))?;
        Self::new(year, month)
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("month key validated on construction")
    }

    pub fn last_day(&self) -> NaiveDate {
        let next_first = match self.month {
            12 => NaiveDate::from_ymd_opt(self.year + 1, 1, 1),
            _ => NaiveDate::from_ymd_opt(self.year, self.month + 1, 1),
        };
        next_first
            .and_then(|date| date.pred_opt())
            .expect("month key validated on construction")
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        self.first_day()
            .iter_days()
            .take(self.days_in_month() as usize)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            year: i32,
            month: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        MonthKey::new(raw.year, raw.month).map_err(serde::de::Error::custom)
    }
}

/// Month-level row: target metadata without the day entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthMeta {
    pub key: MonthKey,
    pub meta_hours: f64,
    pub meta_points: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A month's entries bundled with its metadata, ordered by date. Created
/// lazily on first open; the year+month identity never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAggregate {
    pub meta: MonthMeta,
    pub entries: Vec<DailyEntry>,
}

impl MonthlyAggregate {
    pub fn key(&self) -> MonthKey {
        self.meta.key
    }

    pub fn entry_for(&self, date: NaiveDate) -> Option<&DailyEntry> {
        self.entries.iter().find(|entry| entry.date == date)
    }
}
