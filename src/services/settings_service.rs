use serde_json::json;

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::TrackerConfig;

const KEY_TRACKER_CONFIG: &str = "tracker_config";

pub struct SettingsService {
    db: DbPool,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Current configuration; a missing or malformed stored value falls back
    /// to the defaults.
    pub fn config(&self) -> AppResult<TrackerConfig> {
        self.db.with_connection(|conn| {
            Ok(SettingsRepository::get_json(conn, KEY_TRACKER_CONFIG)?.unwrap_or_default())
        })
    }

    pub fn update_config(&self, config: TrackerConfig) -> AppResult<TrackerConfig> {
        validate_config(&config)?;

        self.db.with_connection(|conn| {
            SettingsRepository::put_json(conn, KEY_TRACKER_CONFIG, &config)?;
            Ok(config.clone())
        })
    }

    pub fn reset_config(&self) -> AppResult<TrackerConfig> {
        self.db.with_connection(|conn| {
            SettingsRepository::delete(conn, KEY_TRACKER_CONFIG)?;
            Ok(TrackerConfig::default())
        })
    }
}

fn validate_config(config: &TrackerConfig) -> AppResult<()> {
    for (field, value) in [
        ("defaultMetaHours", config.default_meta_hours),
        ("defaultMetaPoints", config.default_meta_points),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::validation_with_details(
                "config values must be non-negative finite numbers",
                json!({ "field": field, "value": value.to_string() }),
            ));
        }
    }
    Ok(())
}
