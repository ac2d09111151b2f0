use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::db::repositories::parse_timestamp;
use crate::error::{AppError, AppResult};
use crate::models::month::{MonthKey, MonthMeta};

#[derive(Debug, Clone)]
pub struct MonthlyAggregateRow {
    pub id: String,
    pub year: i32,
    pub month: i64,
    pub meta_hours: f64,
    pub meta_points: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl MonthlyAggregateRow {
    pub fn from_model(meta: &MonthMeta) -> Self {
        Self {
            id: meta.key.storage_key(),
            year: meta.key.year(),
            month: i64::from(meta.key.month()),
            meta_hours: meta.meta_hours,
            meta_points: meta.meta_points,
            created_at: meta.created_at.to_rfc3339(),
            updated_at: meta.updated_at.to_rfc3339(),
        }
    }

    pub fn into_model(self) -> AppResult<MonthMeta> {
        let month = u32::try_from(self.month)
            .map_err(|_| AppError::database(format!("bad month value {} in {}", self.month, self.id)))?;

        Ok(MonthMeta {
            key: MonthKey::new(self.year, month)?,
            meta_hours: self.meta_hours,
            meta_points: self.meta_points,
            created_at: parse_timestamp(&self.created_at, "monthly_aggregates.created_at"),
            updated_at: parse_timestamp(&self.updated_at, "monthly_aggregates.updated_at"),
        })
    }
}

impl TryFrom<&Row<'_>> for MonthlyAggregateRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("year")?,
            month: row.get("month")?,
            meta_hours: row.get("meta_hours")?,
            meta_points: row.get("meta_points")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = r#"
    id,
    year,
    month,
    meta_hours,
    meta_points,
    created_at,
    updated_at
"#;

pub struct MonthRepository;

impl MonthRepository {
    pub fn insert(conn: &Connection, meta: &MonthMeta) -> AppResult<()> {
        let row = MonthlyAggregateRow::from_model(meta);

        conn.execute(
            r#"
                INSERT INTO monthly_aggregates (
                    id, year, month, meta_hours, meta_points, created_at, updated_at
                ) VALUES (
                    :id, :year, :month, :meta_hours, :meta_points, :created_at, :updated_at
                )
                ON CONFLICT(id) DO NOTHING
            "#,
            named_params! {
                ":id": &row.id,
                ":year": &row.year,
                ":month": &row.month,
                ":meta_hours": &row.meta_hours,
                ":meta_points": &row.meta_points,
                ":created_at": &row.created_at,
                ":updated_at": &row.updated_at,
            },
        )?;

        Ok(())
    }

    pub fn find_by_key(conn: &Connection, key: MonthKey) -> AppResult<Option<MonthMeta>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monthly_aggregates WHERE id = :id"
        ))?;

        let row = stmt
            .query_row(named_params! {":id": key.storage_key()}, |row| {
                MonthlyAggregateRow::try_from(row)
            })
            .optional()?;

        row.map(MonthlyAggregateRow::into_model).transpose()
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<MonthMeta>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM monthly_aggregates ORDER BY year ASC, month ASC"
        ))?;

        let rows = stmt
            .query_map([], |row| MonthlyAggregateRow::try_from(row))?
            .map(|row| {
                row.map_err(AppError::from)
                    .and_then(MonthlyAggregateRow::into_model)
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(rows)
    }

    pub fn touch(conn: &Connection, key: MonthKey) -> AppResult<()> {
        conn.execute(
            "UPDATE monthly_aggregates SET updated_at = :updated_at WHERE id = :id",
            named_params! {
                ":id": key.storage_key(),
                ":updated_at": chrono::Utc::now().to_rfc3339(),
            },
        )?;
        Ok(())
    }
}
