use serde::de::DeserializeOwned;
use serde::Serialize;
use rusqlite::{named_params, Connection, OptionalExtension};
use tracing::warn;

use crate::error::AppResult;

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, key: &str) -> AppResult<Option<String>> {
        let value = conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = :key",
                named_params! {":key": key},
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    pub fn upsert(conn: &Connection, key: &str, value: &str) -> AppResult<()> {
        conn.execute(
            r#"
                INSERT INTO app_settings (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            named_params! {":key": key, ":value": value},
        )?;

        Ok(())
    }

    pub fn delete(conn: &Connection, key: &str) -> AppResult<()> {
        conn.execute(
            "DELETE FROM app_settings WHERE key = :key",
            named_params! {":key": key},
        )?;
        Ok(())
    }

    /// Typed read; a missing or malformed value yields `None` (malformed
    /// values are logged, not fatal).
    pub fn get_json<T: DeserializeOwned>(conn: &Connection, key: &str) -> AppResult<Option<T>> {
        let Some(raw) = Self::get(conn, key)? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(target: "app::db", %key, %err, "malformed setting value, ignoring");
                Ok(None)
            }
        }
    }

    pub fn put_json<T: Serialize>(conn: &Connection, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        Self::upsert(conn, key, &raw)
    }
}
