use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 5;
pub const DEFAULT_IMPORTANCE: u8 = 3;

pub const DEFAULT_COLOR: &str = "#3b82f6";

/// Planned hours per weekday. A day left unset falls back to the activity's
/// flat `target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayTargets {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thu: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fri: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun: Option<f64>,
}

impl WeekdayTargets {
    pub fn get(&self, weekday: Weekday) -> Option<f64> {
        match weekday {
            Weekday::Mon => self.mon,
            Weekday::Tue => self.tue,
            Weekday::Wed => self.wed,
            Weekday::Thu => self.thu,
            Weekday::Fri => self.fri,
            Weekday::Sat => self.sat,
            Weekday::Sun => self.sun,
        }
    }

    pub fn set(&mut self, weekday: Weekday, hours: Option<f64>) {
        let slot = match weekday {
            Weekday::Mon => &mut self.mon,
            Weekday::Tue => &mut self.tue,
            Weekday::Wed => &mut self.wed,
            Weekday::Thu => &mut self.thu,
            Weekday::Fri => &mut self.fri,
            Weekday::Sat => &mut self.sat,
            Weekday::Sun => &mut self.sun,
        };
        *slot = hours;
    }

    pub fn is_empty(&self) -> bool {
        self.values().all(|value| value.is_none())
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        [
            self.mon, self.tue, self.wed, self.thu, self.fri, self.sat, self.sun,
        ]
        .into_iter()
    }
}

/// A user-defined activity with its scoring configuration.
///
/// Activities are addressed by an opaque UUID; `name` is display-only, so
/// renaming never orphans historical entries. `hidden` is a soft delete:
/// hidden activities keep their history but contribute nothing to scores,
/// planned totals or streaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityWeight {
    pub id: String,
    pub name: String,
    pub color: String,
    /// 1-5 star weight, default 3.
    pub importance: u8,
    /// Flat planned hours per day, used when no weekday override matches.
    pub target: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets_by_day: Option<WeekdayTargets>,
    pub position: i64,
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivityWeight {
    /// Planned hours for one calendar day: weekday override if present, else
    /// the flat target.
    pub fn planned_hours(&self, weekday: Weekday) -> f64 {
        self.targets_by_day
            .as_ref()
            .and_then(|targets| targets.get(weekday))
            .unwrap_or(self.target)
    }
}

pub fn clamp_importance(raw: u8) -> u8 {
    raw.clamp(MIN_IMPORTANCE, MAX_IMPORTANCE)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCreateInput {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub targets_by_day: Option<WeekdayTargets>,
}

/// Partial update; `None` fields are left untouched. An empty
/// `targets_by_day` (all weekdays unset) clears the overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityUpdateInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub importance: Option<u8>,
    #[serde(default)]
    pub target: Option<f64>,
    #[serde(default)]
    pub targets_by_day: Option<WeekdayTargets>,
}
