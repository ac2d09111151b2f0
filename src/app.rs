use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::db::DbPool;
use crate::error::AppResult;
use crate::services::activity_service::ActivityService;
use crate::services::journal_service::JournalService;
use crate::services::settings_service::SettingsService;
use crate::services::stats_service::StatsService;
use crate::services::streak_service::StreakService;

/// Shared application state: the pool plus every service wired against it.
/// Cheap to clone; callers hold one of these for the process lifetime.
#[derive(Clone)]
pub struct AppState {
    db: DbPool,
    activities: Arc<ActivityService>,
    journal: Arc<JournalService>,
    stats: Arc<StatsService>,
    streaks: Arc<StreakService>,
    settings: Arc<SettingsService>,
}

impl AppState {
    pub fn new(db: DbPool) -> AppResult<Self> {
        let settings = Arc::new(SettingsService::new(db.clone()));
        let activities = Arc::new(ActivityService::new(db.clone()));
        let journal = Arc::new(JournalService::new(db.clone(), settings.clone()));
        let stats = Arc::new(StatsService::new(db.clone()));
        let streaks = Arc::new(StreakService::new(db.clone()));

        info!(target: "app::state", path = %db.path().display(), "application state initialized");

        Ok(Self {
            db,
            activities,
            journal,
            stats,
            streaks,
            settings,
        })
    }

    /// Open (or create) the database at `data_dir/studygrid.sqlite` and wire
    /// the services against it.
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        std::fs::create_dir_all(data_dir)?;
        let pool = DbPool::new(data_dir.join("studygrid.sqlite"))?;
        Self::new(pool)
    }

    pub fn db(&self) -> &DbPool {
        &self.db
    }

    pub fn activities(&self) -> &ActivityService {
        &self.activities
    }

    pub fn journal(&self) -> &JournalService {
        &self.journal
    }

    pub fn stats(&self) -> &StatsService {
        &self.stats
    }

    pub fn streaks(&self) -> &StreakService {
        &self.streaks
    }

    pub fn settings(&self) -> &SettingsService {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_creates_the_data_directory_and_database() {
        let dir = tempdir().expect("create temp dir");
        let data_dir = dir.path().join("nested").join("data");

        let state = AppState::open(&data_dir).unwrap();
        assert!(data_dir.join("studygrid.sqlite").exists());
        assert!(state.activities().list(true).unwrap().is_empty());
    }
}
