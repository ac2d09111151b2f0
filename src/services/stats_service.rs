use std::collections::HashMap;

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::repositories::month_repository::MonthRepository;
use crate::db::repositories::weight_repository::WeightRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::entry::DailyEntry;
use crate::models::month::MonthKey;
use crate::models::stats::{
    ActivityMonthlyStats, ActivityTotals, GlobalStats, MonthSummary, MonthlyStats,
};
use crate::models::weight::ActivityWeight;
use crate::services::scoring;

/// Read-side aggregation over the stored months. Every number here is
/// derived on demand from the entries and the current weight configuration;
/// nothing is cached or persisted.
pub struct StatsService {
    db: DbPool,
}

impl StatsService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn monthly_stats(&self, key: MonthKey) -> AppResult<MonthlyStats> {
        self.db.with_connection(|conn| {
            let weights = WeightRepository::list(conn, true)?;
            let entries = EntryRepository::list_month(conn, key)?;
            Ok(compute_monthly(key, &entries, &weights))
        })
    }

    /// All-time totals across every stored month. Each month's factor is
    /// re-derived from today's weights, so past months shift when weights
    /// change.
    pub fn global_stats(&self) -> AppResult<GlobalStats> {
        self.db.with_connection(|conn| {
            let weights = WeightRepository::list(conn, true)?;
            let months = MonthRepository::list_all(conn)?;

            let mut total_hours = 0.0;
            let mut total_score = 0i64;
            let mut total_planned = 0.0;
            let mut per_activity: HashMap<String, ActivityTotals> = HashMap::new();

            for meta in &months {
                let entries = EntryRepository::list_month(conn, meta.key)?;
                let monthly = compute_monthly(meta.key, &entries, &weights);

                total_hours += monthly.total_hours;
                total_score += monthly.total_score;
                total_planned += monthly.planned_hours;

                accumulate_activity_totals(
                    &mut per_activity,
                    meta.key,
                    &entries,
                    &weights,
                );
            }

            let goal_percentage = percentage(total_hours, total_planned);

            let mut activities: Vec<_> = per_activity.into_values().collect();
            sort_by_weight_order(&mut activities, &weights, |totals| &totals.activity_id);

            Ok(GlobalStats {
                total_hours,
                total_score,
                total_planned_hours: total_planned,
                goal_percentage,
                months_tracked: months.len(),
                activities,
            })
        })
    }

    /// One summary line per stored month, newest first.
    pub fn monthly_history(&self) -> AppResult<Vec<MonthSummary>> {
        self.db.with_connection(|conn| {
            let weights = WeightRepository::list(conn, true)?;
            let months = MonthRepository::list_all(conn)?;

            let mut history = Vec::with_capacity(months.len());
            for meta in months {
                let entries = EntryRepository::list_month(conn, meta.key)?;
                let monthly = compute_monthly(meta.key, &entries, &weights);
                history.push(MonthSummary {
                    key: meta.key,
                    total_hours: monthly.total_hours,
                    total_score: monthly.total_score,
                    goal_percentage: monthly.goal_percentage,
                    days_with_data: monthly.days_with_data,
                });
            }

            history.reverse();
            Ok(history)
        })
    }
}

fn compute_monthly(
    key: MonthKey,
    entries: &[DailyEntry],
    weights: &[ActivityWeight],
) -> MonthlyStats {
    let factor = scoring::monthly_factor(key, weights);
    let planned_hours = scoring::planned_hours_total(key, weights);

    let mut total_hours = 0.0;
    let mut total_score = 0i64;
    let mut days_with_data = 0usize;

    for entry in entries {
        let visible_hours = visible_hours(entry, weights);
        total_hours += visible_hours;
        total_score += scoring::daily_score(entry, weights, factor);
        if visible_hours > 0.0 {
            days_with_data += 1;
        }
    }

    let mut activities = Vec::new();
    for weight in weights.iter().filter(|w| !w.hidden) {
        let hours: f64 = entries.iter().map(|entry| entry.hours(&weight.id)).sum();
        // rounded per logged day, the same grain as daily_score and the
        // all-time totals
        let score: i64 = entries
            .iter()
            .map(|entry| {
                (factor * entry.hours(&weight.id) * f64::from(weight.importance)).round() as i64
            })
            .sum();
        activities.push(ActivityMonthlyStats {
            activity_id: weight.id.clone(),
            name: weight.name.clone(),
            color: weight.color.clone(),
            hours,
            planned_hours: scoring::planned_hours_for_month(key, weight),
            score,
        });
    }

    let daily_average_score = if days_with_data == 0 {
        0.0
    } else {
        total_score as f64 / days_with_data as f64
    };

    MonthlyStats {
        key,
        factor,
        total_hours,
        total_score,
        planned_hours,
        goal_percentage: percentage(total_hours, planned_hours),
        days_with_data,
        daily_average_score,
        activities,
    }
}

fn accumulate_activity_totals(
    per_activity: &mut HashMap<String, ActivityTotals>,
    key: MonthKey,
    entries: &[DailyEntry],
    weights: &[ActivityWeight],
) {
    let factor = scoring::monthly_factor(key, weights);

    for weight in weights.iter().filter(|w| !w.hidden) {
        let totals = per_activity
            .entry(weight.id.clone())
            .or_insert_with(|| ActivityTotals {
                activity_id: weight.id.clone(),
                name: weight.name.clone(),
                color: weight.color.clone(),
                hours: 0.0,
                score: 0,
                days_logged: 0,
            });

        for entry in entries {
            let hours = entry.hours(&weight.id);
            if hours > 0.0 {
                totals.hours += hours;
                totals.score += (factor * hours * f64::from(weight.importance)).round() as i64;
                totals.days_logged += 1;
            }
        }
    }
}

/// Percentage of goal for display, capped at 100. No plan means no
/// meaningful percentage, rendered as 0.
fn percentage(hours: f64, planned: f64) -> f64 {
    if planned <= 0.0 {
        return 0.0;
    }
    (hours / planned * 100.0).min(100.0)
}

fn visible_hours(entry: &DailyEntry, weights: &[ActivityWeight]) -> f64 {
    entry
        .activities
        .iter()
        .filter(|(id, _)| {
            weights
                .iter()
                .any(|weight| !weight.hidden && weight.id == **id)
        })
        .map(|(_, hours)| hours)
        .sum()
}

fn sort_by_weight_order<T>(
    items: &mut [T],
    weights: &[ActivityWeight],
    id_of: impl Fn(&T) -> &String,
) {
    let order: HashMap<&str, usize> = weights
        .iter()
        .enumerate()
        .map(|(index, weight)| (weight.id.as_str(), index))
        .collect();
    items.sort_by_key(|item| order.get(id_of(item).as_str()).copied().unwrap_or(usize::MAX));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use tempfile::tempdir;

    use super::*;
    use crate::models::weight::ActivityCreateInput;
    use crate::services::activity_service::ActivityService;
    use crate::services::journal_service::JournalService;
    use crate::services::settings_service::SettingsService;

    struct Fixture {
        stats: StatsService,
        journal: JournalService,
        activities: ActivityService,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().expect("create temp dir");
        let pool = DbPool::new(dir.path().join("stats.sqlite")).expect("create db pool");
        let settings = Arc::new(SettingsService::new(pool.clone()));
        Fixture {
            stats: StatsService::new(pool.clone()),
            journal: JournalService::new(pool.clone(), settings),
            activities: ActivityService::new(pool),
            _dir: dir,
        }
    }

    fn create_activity(fx: &Fixture, name: &str, importance: u8, target: f64) -> String {
        fx.activities
            .create(ActivityCreateInput {
                name: name.into(),
                importance: Some(importance),
                target: Some(target),
                ..Default::default()
            })
            .unwrap()
            .id
    }

    #[test]
    fn monthly_stats_follow_the_normalized_factor() {
        let fx = fixture();
        let study = create_activity(&fx, "Study", 3, 2.0);
        let key = MonthKey::new(2025, 6).unwrap();

        // two on-target days, one half day
        for day in [1, 2] {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            fx.journal.record_hours(date, &study, 2.0).unwrap();
        }
        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), &study, 1.0)
            .unwrap();

        let stats = fx.stats.monthly_stats(key).unwrap();
        assert!((stats.factor - 30_000.0 / 180.0).abs() < 1e-9);
        assert_eq!(stats.total_score, 2500);
        assert!((stats.total_hours - 5.0).abs() < 1e-9);
        assert!((stats.planned_hours - 60.0).abs() < 1e-9);
        assert_eq!(stats.days_with_data, 3);
        assert!((stats.daily_average_score - 2500.0 / 3.0).abs() < 1e-9);

        assert_eq!(stats.activities.len(), 1);
        let line = &stats.activities[0];
        assert_eq!(line.activity_id, study);
        assert_eq!(line.score, 2500);
        assert!((line.planned_hours - 60.0).abs() < 1e-9);
    }

    #[test]
    fn goal_percentage_is_capped_for_display() {
        let fx = fixture();
        let study = create_activity(&fx, "Study", 3, 0.1);
        let key = MonthKey::new(2025, 6).unwrap();

        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), &study, 8.0)
            .unwrap();

        let stats = fx.stats.monthly_stats(key).unwrap();
        assert_eq!(stats.goal_percentage, 100.0);
    }

    #[test]
    fn an_untouched_month_is_all_zeros() {
        let fx = fixture();
        create_activity(&fx, "Study", 3, 2.0);

        let stats = fx.stats.monthly_stats(MonthKey::new(2030, 1).unwrap()).unwrap();
        assert_eq!(stats.total_score, 0);
        assert_eq!(stats.total_hours, 0.0);
        assert_eq!(stats.days_with_data, 0);
        assert_eq!(stats.daily_average_score, 0.0);
    }

    #[test]
    fn global_stats_span_months_and_reuse_current_weights() {
        let fx = fixture();
        let study = create_activity(&fx, "Study", 3, 2.0);

        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 5, 10).unwrap(), &study, 2.0)
            .unwrap();
        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(), &study, 2.0)
            .unwrap();

        let global = fx.stats.global_stats().unwrap();
        assert_eq!(global.months_tracked, 2);
        assert!((global.total_hours - 4.0).abs() < 1e-9);
        // one on-target day per month
        assert_eq!(global.total_score, 2000);

        assert_eq!(global.activities.len(), 1);
        assert_eq!(global.activities[0].days_logged, 2);
    }

    #[test]
    fn history_lists_months_newest_first() {
        let fx = fixture();
        let study = create_activity(&fx, "Study", 3, 2.0);

        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(), &study, 1.0)
            .unwrap();
        fx.journal
            .record_hours(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), &study, 1.0)
            .unwrap();

        let history = fx.stats.monthly_history().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].key, MonthKey::new(2025, 6).unwrap());
        assert_eq!(history[1].key, MonthKey::new(2025, 4).unwrap());
    }

    #[test]
    fn activity_scores_round_at_the_same_grain_everywhere() {
        let fx = fixture();
        // F = 30000 / (30 * 3 * 3), so one logged hour is worth 333.33 points
        let study = create_activity(&fx, "Study", 3, 3.0);
        let key = MonthKey::new(2025, 6).unwrap();

        for day in [1, 2] {
            let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
            fx.journal.record_hours(date, &study, 1.0).unwrap();
        }

        // two days of 333 each, never 667 from rounding the month once
        let monthly = fx.stats.monthly_stats(key).unwrap();
        assert_eq!(monthly.activities[0].score, 666);
        assert_eq!(monthly.total_score, 666);

        let global = fx.stats.global_stats().unwrap();
        assert_eq!(global.activities[0].score, monthly.activities[0].score);
        assert_eq!(global.total_score, monthly.total_score);
    }

    #[test]
    fn hidden_activity_hours_are_excluded_from_totals() {
        let fx = fixture();
        let study = create_activity(&fx, "Study", 3, 2.0);
        let chores = create_activity(&fx, "Chores", 2, 1.0);
        let key = MonthKey::new(2025, 6).unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 5).unwrap();
        fx.journal.record_hours(date, &study, 2.0).unwrap();
        fx.journal.record_hours(date, &chores, 1.0).unwrap();
        fx.activities.set_hidden(&chores, true).unwrap();

        let stats = fx.stats.monthly_stats(key).unwrap();
        assert!((stats.total_hours - 2.0).abs() < 1e-9);
        assert_eq!(stats.activities.len(), 1);
        assert_eq!(stats.activities[0].activity_id, study);
    }
}
