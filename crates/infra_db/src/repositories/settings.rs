//! Settings repository
//!
//! A plain key-value table of JSON documents grouped by category.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::DatabaseError;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        let value = sqlx::query_scalar::<_, Json<serde_json::Value>>(
            "SELECT value FROM settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(|Json(v)| v))
    }

    /// Inserts or replaces the value stored under `key`
    pub async fn upsert(
        &self,
        key: &str,
        value: &serde_json::Value,
        category: &str,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, category, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (key) DO UPDATE
               SET value = EXCLUDED.value,
                   category = EXCLUDED.category,
                   updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key)
        .bind(Json(value))
        .bind(category)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_category(&self, category: &str) -> Result<Vec<(String, serde_json::Value)>, DatabaseError> {
        let rows = sqlx::query_as::<_, (String, Json<serde_json::Value>)>(
            "SELECT key, value FROM settings WHERE category = $1 ORDER BY key",
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(k, Json(v))| (k, v)).collect())
    }
}
