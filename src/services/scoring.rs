//! The normalization-factor scoring arithmetic. Pure functions over
//! in-memory collections; persistence and assembly live in the services.
//!
//! The anchor: a month where every visible activity exactly meets its
//! planned target every day scores `days_in_month * 1000` in total. The
//! per-month factor `F` is derived so that this holds regardless of how
//! many activities exist or how their importance is distributed.

use chrono::Datelike;

use crate::models::entry::DailyEntry;
use crate::models::month::MonthKey;
use crate::models::weight::ActivityWeight;

/// Score a fully-on-target day is worth.
pub const DAILY_SCORE_CEILING: f64 = 1000.0;

/// Per-month normalization factor.
///
/// `F = (days_in_month * 1000) / W`, with `W` the sum over every calendar
/// day and every visible activity of `planned_hours(weekday) * importance`.
/// A month with no planned weighted hours has `F = 0`: logged time earns
/// nothing when nothing was planned (division by zero handled by
/// definition, not as an error).
pub fn monthly_factor(month: MonthKey, weights: &[ActivityWeight]) -> f64 {
    let mut weighted_planned = 0.0;

    for date in month.iter_days() {
        for weight in weights.iter().filter(|weight| !weight.hidden) {
            weighted_planned +=
                weight.planned_hours(date.weekday()) * f64::from(weight.importance);
        }
    }

    if weighted_planned == 0.0 {
        return 0.0;
    }

    f64::from(month.days_in_month()) * DAILY_SCORE_CEILING / weighted_planned
}

/// One day's point value: `F * hours * importance` summed over logged
/// activities, rounded to the nearest integer.
///
/// Hours logged under an id with no matching weight, or whose weight is
/// hidden, contribute nothing; the stored hours themselves stay untouched.
pub fn daily_score(entry: &DailyEntry, weights: &[ActivityWeight], factor: f64) -> i64 {
    if factor == 0.0 {
        return 0;
    }

    let mut score = 0.0;
    for (activity_id, hours) in &entry.activities {
        let Some(weight) = weights
            .iter()
            .find(|weight| !weight.hidden && weight.id == *activity_id)
        else {
            continue;
        };

        score += factor * hours * f64::from(weight.importance);
    }

    score.round() as i64
}

/// Planned hours for one activity summed over every day of the month.
pub fn planned_hours_for_month(month: MonthKey, weight: &ActivityWeight) -> f64 {
    month
        .iter_days()
        .map(|date| weight.planned_hours(date.weekday()))
        .sum()
}

/// Unweighted planned hours for all visible activities: the denominator of
/// the percentage-of-goal display.
pub fn planned_hours_total(month: MonthKey, weights: &[ActivityWeight]) -> f64 {
    weights
        .iter()
        .filter(|weight| !weight.hidden)
        .map(|weight| planned_hours_for_month(month, weight))
        .sum()
}
