use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};
use tracing::warn;

use crate::db::repositories::parse_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::weight::{clamp_importance, ActivityWeight, WeekdayTargets};

#[derive(Debug, Clone)]
pub struct ActivityWeightRow {
    pub id: String,
    pub name: String,
    pub color: String,
    pub importance: i64,
    pub target: f64,
    pub targets_by_day: Option<String>,
    pub position: i64,
    pub hidden: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ActivityWeightRow {
    pub fn from_model(weight: &ActivityWeight) -> AppResult<Self> {
        let targets_by_day = weight
            .targets_by_day
            .as_ref()
            .filter(|targets| !targets.is_empty())
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            id: weight.id.clone(),
            name: weight.name.clone(),
            color: weight.color.clone(),
            importance: i64::from(weight.importance),
            target: weight.target,
            targets_by_day,
            position: weight.position,
            hidden: weight.hidden,
            created_at: weight.created_at.to_rfc3339(),
            updated_at: weight.updated_at.to_rfc3339(),
        })
    }

    pub fn into_model(self) -> ActivityWeight {
        let targets_by_day = self.targets_by_day.as_deref().and_then(|raw| {
            match serde_json::from_str::<WeekdayTargets>(raw) {
                Ok(targets) if !targets.is_empty() => Some(targets),
                Ok(_) => None,
                Err(err) => {
                    warn!(
                        target: "app::db",
                        weight_id = %self.id,
                        %err,
                        "ignoring malformed weekday targets"
                    );
                    None
                }
            }
        });

        ActivityWeight {
            importance: clamp_importance(self.importance.clamp(0, u8::MAX as i64) as u8),
            targets_by_day,
            created_at: parse_timestamp(&self.created_at, "activity_weights.created_at"),
            updated_at: parse_timestamp(&self.updated_at, "activity_weights.updated_at"),
            id: self.id,
            name: self.name,
            color: self.color,
            target: self.target,
            position: self.position,
            hidden: self.hidden,
        }
    }
}

impl TryFrom<&Row<'_>> for ActivityWeightRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            color: row.get("color")?,
            importance: row.get("importance")?,
            target: row.get("target")?,
            targets_by_day: row.get("targets_by_day")?,
            position: row.get("position")?,
            hidden: row.get("hidden")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    id,
    name,
    color,
    importance,
    target,
    targets_by_day,
    position,
    hidden,
    created_at,
    updated_at
"#;

pub struct WeightRepository;

impl WeightRepository {
    pub fn insert(conn: &Connection, weight: &ActivityWeight) -> AppResult<()> {
        let row = ActivityWeightRow::from_model(weight)?;

        conn.execute(
            r#"
                INSERT INTO activity_weights (
                    id, name, color, importance, target,
                    targets_by_day, position, hidden, created_at, updated_at
                ) VALUES (
                    :id, :name, :color, :importance, :target,
                    :targets_by_day, :position, :hidden, :created_at, :updated_at
                )
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":color": &row.color,
                ":importance": &row.importance,
                ":target": &row.target,
                ":targets_by_day": &row.targets_by_day,
                ":position": &row.position,
                ":hidden": &row.hidden,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, weight: &ActivityWeight) -> AppResult<()> {
        let row = ActivityWeightRow::from_model(weight)?;

        let changed = conn.execute(
            r#"
                UPDATE activity_weights SET
                    name = :name,
                    color = :color,
                    importance = :importance,
                    target = :target,
                    targets_by_day = :targets_by_day,
                    position = :position,
                    hidden = :hidden,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": &row.id,
                ":name": &row.name,
                ":color": &row.color,
                ":importance": &row.importance,
                ":target": &row.target,
                ":targets_by_day": &row.targets_by_day,
                ":position": &row.position,
                ":hidden": &row.hidden,
                ":updated_at": &row.updated_at,
            },
        )?;

        if changed == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn find_by_id(conn: &Connection, id: &str) -> AppResult<Option<ActivityWeight>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM activity_weights WHERE id = :id"
        ))?;

        let row = stmt
            .query_row(named_params! {":id": id}, |row| {
                ActivityWeightRow::try_from(row)
            })
            .optional()?;

        Ok(row.map(ActivityWeightRow::into_model))
    }

    pub fn list(conn: &Connection, include_hidden: bool) -> AppResult<Vec<ActivityWeight>> {
        let sql = if include_hidden {
            format!("SELECT {SELECT_COLUMNS} FROM activity_weights ORDER BY position ASC, created_at ASC")
        } else {
            format!(
                "SELECT {SELECT_COLUMNS} FROM activity_weights WHERE hidden = 0 ORDER BY position ASC, created_at ASC"
            )
        };

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| ActivityWeightRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows.into_iter().map(ActivityWeightRow::into_model).collect())
    }

    pub fn set_hidden(conn: &Connection, id: &str, hidden: bool) -> AppResult<()> {
        let changed = conn.execute(
            r#"
                UPDATE activity_weights SET
                    hidden = :hidden,
                    updated_at = :updated_at
                WHERE id = :id
            "#,
            named_params! {
                ":id": id,
                ":hidden": hidden,
                ":updated_at": chrono::Utc::now().to_rfc3339(),
            },
        )?;

        if changed == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn set_position(conn: &Connection, id: &str, position: i64) -> AppResult<()> {
        let changed = conn.execute(
            "UPDATE activity_weights SET position = :position, updated_at = :updated_at WHERE id = :id",
            named_params! {
                ":id": id,
                ":position": position,
                ":updated_at": chrono::Utc::now().to_rfc3339(),
            },
        )?;

        if changed == 0 {
            return Err(AppError::not_found());
        }

        Ok(())
    }

    pub fn delete(conn: &Connection, id: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM activity_weights WHERE id = :id",
            named_params! {":id": id},
        )?;
        Ok(())
    }

    pub fn max_position(conn: &Connection) -> AppResult<i64> {
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(position) FROM activity_weights",
            [],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }
}
