use serde::{Deserialize, Serialize};

use crate::models::month::MonthKey;

/// Aggregated view of one month. Hour and score totals are raw sums;
/// `goal_percentage` is the display value, capped at 100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStats {
    pub key: MonthKey,
    pub factor: f64,
    pub total_hours: f64,
    pub total_score: i64,
    pub planned_hours: f64,
    pub goal_percentage: f64,
    pub days_with_data: usize,
    pub daily_average_score: f64,
    pub activities: Vec<ActivityMonthlyStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMonthlyStats {
    pub activity_id: String,
    pub name: String,
    pub color: String,
    pub hours: f64,
    pub planned_hours: f64,
    pub score: i64,
}

/// All-time aggregation across every stored month. Each month's factor is
/// re-derived from the current weight configuration, so these numbers drift
/// when weights change; that matches the original behavior and is deliberate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    pub total_hours: f64,
    pub total_score: i64,
    pub total_planned_hours: f64,
    pub goal_percentage: f64,
    pub months_tracked: usize,
    pub activities: Vec<ActivityTotals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTotals {
    pub activity_id: String,
    pub name: String,
    pub color: String,
    pub hours: f64,
    pub score: i64,
    pub days_logged: usize,
}

/// One line of the month-by-month history view, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    pub key: MonthKey,
    pub total_hours: f64,
    pub total_score: i64,
    pub goal_percentage: f64,
    pub days_with_data: usize,
}
