use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::db::repositories::entry_repository::EntryRepository;
use crate::db::repositories::weight_repository::WeightRepository;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::weight::{
    clamp_importance, ActivityCreateInput, ActivityUpdateInput, ActivityWeight, WeekdayTargets,
    DEFAULT_COLOR, DEFAULT_IMPORTANCE,
};

/// Outcome of a removal request. Activities referenced by historical
/// entries are never hard-deleted; hiding keeps their history intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityRemoval {
    Deleted,
    Hidden,
}

pub struct ActivityService {
    db: DbPool,
}

impl ActivityService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn create(&self, input: ActivityCreateInput) -> AppResult<ActivityWeight> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("activity name must not be empty"));
        }

        let target = input.target.unwrap_or(0.0);
        validate_hours(target, "target")?;
        if let Some(targets) = &input.targets_by_day {
            validate_weekday_targets(targets)?;
        }

        self.db.with_connection(|conn| {
            let visible = WeightRepository::list(conn, false)?;
            if visible.iter().any(|weight| weight.name == name) {
                return Err(AppError::conflict(format!(
                    "an activity named {name:?} already exists"
                )));
            }

            let now = Utc::now();
            let weight = ActivityWeight {
                id: Uuid::new_v4().to_string(),
                name: name.clone(),
                color: input
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
                importance: clamp_importance(input.importance.unwrap_or(DEFAULT_IMPORTANCE)),
                target,
                targets_by_day: input
                    .targets_by_day
                    .clone()
                    .filter(|targets| !targets.is_empty()),
                position: WeightRepository::max_position(conn)? + 1,
                hidden: false,
                created_at: now,
                updated_at: now,
            };

            WeightRepository::insert(conn, &weight)?;
            info!(target: "app::activity", id = %weight.id, name = %weight.name, "activity created");
            Ok(weight)
        })
    }

    pub fn get(&self, id: &str) -> AppResult<ActivityWeight> {
        self.db
            .with_connection(|conn| WeightRepository::find_by_id(conn, id))?
            .ok_or(AppError::NotFound)
    }

    pub fn list(&self, include_hidden: bool) -> AppResult<Vec<ActivityWeight>> {
        self.db
            .with_connection(|conn| WeightRepository::list(conn, include_hidden))
    }

    /// In-place update. Renames are safe: history references the id, not
    /// the display name.
    pub fn update(&self, id: &str, input: ActivityUpdateInput) -> AppResult<ActivityWeight> {
        if let Some(target) = input.target {
            validate_hours(target, "target")?;
        }
        if let Some(targets) = &input.targets_by_day {
            validate_weekday_targets(targets)?;
        }

        self.db.with_connection(|conn| {
            let mut weight =
                WeightRepository::find_by_id(conn, id)?.ok_or(AppError::NotFound)?;

            if let Some(name) = &input.name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(AppError::validation("activity name must not be empty"));
                }
                weight.name = name.to_string();
            }
            if let Some(color) = &input.color {
                weight.color = color.clone();
            }
            if let Some(importance) = input.importance {
                weight.importance = clamp_importance(importance);
            }
            if let Some(target) = input.target {
                weight.target = target;
            }
            if let Some(targets) = &input.targets_by_day {
                // an all-unset override set clears the per-weekday targets
                weight.targets_by_day = Some(targets.clone()).filter(|t| !t.is_empty());
            }
            weight.updated_at = Utc::now();

            WeightRepository::update(conn, &weight)?;
            Ok(weight)
        })
    }

    pub fn set_hidden(&self, id: &str, hidden: bool) -> AppResult<ActivityWeight> {
        self.db.with_connection(|conn| {
            WeightRepository::set_hidden(conn, id, hidden)?;
            WeightRepository::find_by_id(conn, id)?.ok_or(AppError::NotFound)
        })
    }

    /// Delete if no historical entry references the activity; otherwise
    /// downgrade to hiding so history stays resolvable.
    pub fn remove(&self, id: &str) -> AppResult<ActivityRemoval> {
        self.db.with_connection(|conn| {
            let weight = WeightRepository::find_by_id(conn, id)?.ok_or(AppError::NotFound)?;

            if EntryRepository::any_with_activity(conn, id)? {
                WeightRepository::set_hidden(conn, id, true)?;
                info!(
                    target: "app::activity",
                    id = %weight.id,
                    name = %weight.name,
                    "activity has history, hidden instead of deleted"
                );
                return Ok(ActivityRemoval::Hidden);
            }

            WeightRepository::delete(conn, id)?;
            info!(target: "app::activity", id = %weight.id, name = %weight.name, "activity deleted");
            Ok(ActivityRemoval::Deleted)
        })
    }

    /// Rewrite positions to match the given id order. Every listed id must
    /// exist; ids not listed keep their position.
    pub fn reorder(&self, ordered_ids: &[String]) -> AppResult<Vec<ActivityWeight>> {
        self.db.with_connection(|conn| {
            for (index, id) in ordered_ids.iter().enumerate() {
                if WeightRepository::find_by_id(conn, id)?.is_none() {
                    return Err(AppError::validation(format!("unknown activity id: {id}")));
                }
                WeightRepository::set_position(conn, id, (index + 1) as i64)?;
            }
            WeightRepository::list(conn, false)
        })
    }
}

fn validate_hours(value: f64, field: &str) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} must be a non-negative finite number of hours, got {value}"
        )));
    }
    Ok(())
}

fn validate_weekday_targets(targets: &WeekdayTargets) -> AppResult<()> {
    for value in targets.values().flatten() {
        validate_hours(value, "weekday target")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn create_service() -> (ActivityService, DbPool, tempfile::TempDir) {
        let dir = tempdir().expect("create temp dir");
        let pool = DbPool::new(dir.path().join("activities.sqlite")).expect("create db pool");
        (ActivityService::new(pool.clone()), pool, dir)
    }

    fn input(name: &str) -> ActivityCreateInput {
        ActivityCreateInput {
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_applies_defaults_and_appends_position() {
        let (service, _pool, _dir) = create_service();

        let study = service.create(input("Study")).unwrap();
        assert_eq!(study.importance, DEFAULT_IMPORTANCE);
        assert_eq!(study.target, 0.0);
        assert_eq!(study.position, 1);
        assert!(!study.hidden);

        let english = service.create(input("English")).unwrap();
        assert_eq!(english.position, 2);
    }

    #[test]
    fn duplicate_visible_names_conflict() {
        let (service, _pool, _dir) = create_service();
        service.create(input("Study")).unwrap();

        let duplicate = service.create(input("  Study  "));
        assert!(matches!(duplicate, Err(AppError::Conflict { .. })));
    }

    #[test]
    fn importance_is_clamped_on_create_and_update() {
        let (service, _pool, _dir) = create_service();

        let created = service
            .create(ActivityCreateInput {
                name: "Study".into(),
                importance: Some(9),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created.importance, 5);

        let updated = service
            .update(
                &created.id,
                ActivityUpdateInput {
                    importance: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.importance, 1);
    }

    #[test]
    fn rename_keeps_the_id() {
        let (service, _pool, _dir) = create_service();
        let created = service.create(input("Study")).unwrap();

        let renamed = service
            .update(
                &created.id,
                ActivityUpdateInput {
                    name: Some("Deep Work".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.name, "Deep Work");
    }

    #[test]
    fn remove_without_history_deletes() {
        let (service, _pool, _dir) = create_service();
        let created = service.create(input("Study")).unwrap();

        assert_eq!(service.remove(&created.id).unwrap(), ActivityRemoval::Deleted);
        assert!(matches!(service.get(&created.id), Err(AppError::NotFound)));
    }

    #[test]
    fn remove_with_history_hides_instead() {
        use crate::models::entry::DailyEntry;

        let (service, pool, _dir) = create_service();
        let created = service.create(input("Study")).unwrap();

        let mut entry =
            DailyEntry::empty(chrono::NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
        entry.activities.insert(created.id.clone(), 1.5);
        pool.with_connection(|conn| EntryRepository::upsert(conn, &entry))
            .unwrap();

        assert_eq!(service.remove(&created.id).unwrap(), ActivityRemoval::Hidden);
        let hidden = service.get(&created.id).unwrap();
        assert!(hidden.hidden);
        assert!(service.list(false).unwrap().is_empty());
        assert_eq!(service.list(true).unwrap().len(), 1);
    }

    #[test]
    fn reorder_rewrites_positions() {
        let (service, _pool, _dir) = create_service();
        let a = service.create(input("A")).unwrap();
        let b = service.create(input("B")).unwrap();
        let c = service.create(input("C")).unwrap();

        let reordered = service
            .reorder(&[c.id.clone(), a.id.clone(), b.id.clone()])
            .unwrap();
        let names: Vec<_> = reordered.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, ["C", "A", "B"]);
    }
}
