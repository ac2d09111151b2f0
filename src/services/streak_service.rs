use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use tracing::warn;

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::repositories::weight_repository::WeightRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::entry::DailyEntry;
use crate::models::month::MonthKey;

/// Minimum logged hours for a day to count toward a streak.
pub const MINIMUM_STREAK_HOURS: f64 = 0.5;

/// Hard cap on the backward walk, roughly five and a half years.
const MAX_STREAK_ITERATIONS: u32 = 2000;

/// Consecutive-day streak computation. Walks backwards from today one day
/// at a time, loading entries a month at a time.
pub struct StreakService {
    db: DbPool,
}

impl StreakService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Length of the current streak for one activity, counting backwards
    /// from `today`.
    ///
    /// A day counts when its logged hours reach [`MINIMUM_STREAK_HOURS`].
    /// Today itself is allowed to be below the threshold without breaking
    /// the streak (the day is not over yet); it is skipped, not counted.
    /// A day with no entry breaks the streak.
    pub fn current_streak(&self, activity_id: &str, today: NaiveDate) -> AppResult<u32> {
        self.db
            .with_connection(|conn| Ok(walk_streak(conn, activity_id, today)))
    }

    /// Streaks for every visible activity, keyed by activity id.
    pub fn current_streaks(&self, today: NaiveDate) -> AppResult<HashMap<String, u32>> {
        self.db.with_connection(|conn| {
            let weights = WeightRepository::list(conn, false)?;
            let mut streaks = HashMap::with_capacity(weights.len());
            for weight in weights {
                let streak = walk_streak(conn, &weight.id, today);
                streaks.insert(weight.id, streak);
            }
            Ok(streaks)
        })
    }
}

fn walk_streak(conn: &Connection, activity_id: &str, today: NaiveDate) -> u32 {
    let mut cache = MonthCache::default();
    let mut streak = 0u32;
    let mut current = today;

    for _ in 0..MAX_STREAK_ITERATIONS {
        let hours = match cache.entry(conn, current) {
            Ok(entry) => entry.map(|e| e.hours(activity_id)).unwrap_or(0.0),
            Err(err) => {
                // return the partial streak rather than failing the caller
                warn!(
                    target: "app::streak",
                    activity_id,
                    date = %current,
                    error = %err,
                    "streak walk aborted on load failure"
                );
                break;
            }
        };

        if hours < MINIMUM_STREAK_HOURS {
            if current == today {
                // today is still in progress, look at yesterday instead
            } else {
                break;
            }
        } else {
            streak += 1;
        }

        let Some(previous) = current.checked_sub_days(Days::new(1)) else {
            break;
        };
        current = previous;
    }

    streak
}

/// One-month lookbehind cache so the walk issues one query per month
/// instead of one per day.
#[derive(Default)]
struct MonthCache {
    key: Option<MonthKey>,
    entries: HashMap<NaiveDate, DailyEntry>,
}

impl MonthCache {
    fn entry(&mut self, conn: &Connection, date: NaiveDate) -> AppResult<Option<&DailyEntry>> {
        let key = MonthKey::from_date(date);
        if self.key != Some(key) {
            let entries = EntryRepository::list_month(conn, key)?;
            self.entries = entries.into_iter().map(|e| (e.date, e)).collect();
            self.key = Some(key);
        }
        Ok(self.entries.get(&date))
    }
}
