use serde::{Deserialize, Serialize};

/// Tracker-wide configuration persisted in `app_settings`. The meta values
/// seed new monthly aggregates; existing months keep whatever they were
/// created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default = "default_meta_hours")]
    pub default_meta_hours: f64,
    #[serde(default = "default_meta_points")]
    pub default_meta_points: f64,
}

fn default_meta_hours() -> f64 {
    100.0
}

fn default_meta_points() -> f64 {
    10_000.0
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            default_meta_hours: default_meta_hours(),
            default_meta_points: default_meta_points(),
        }
    }
}
