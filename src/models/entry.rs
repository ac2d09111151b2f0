use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One record per calendar day. `activities` maps activity id to decimal
/// hours; entries are pre-created empty when their month is first opened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub activities: BTreeMap<String, f64>,
    /// Hour of day as a decimal (e.g. 7.5 for 07:30). Kept as data for the
    /// history view; excluded from scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl DailyEntry {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            activities: BTreeMap::new(),
            wake_time: None,
            sleep_time: None,
            bonus: None,
            notes: None,
            updated_at: Utc::now(),
        }
    }

    pub fn hours(&self, activity_id: &str) -> f64 {
        self.activities.get(activity_id).copied().unwrap_or(0.0)
    }

    /// Whether any hours were logged for one of the given activity ids.
    pub fn has_logged_hours<'a, I>(&self, activity_ids: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        activity_ids.into_iter().any(|id| self.hours(id) > 0.0)
    }
}
