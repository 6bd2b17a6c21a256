//! Site settings repository (Postgres)

use async_trait::async_trait;
use sqlx::{types::Json, Pool, Postgres};

use super::SettingsStore;
use crate::error::AppResult;

#[derive(Clone)]
pub struct SettingsRepository {
    pool: Pool<Postgres>,
}

impl SettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SettingsRepository {
    async fn get(&self, key: &str) -> AppResult<Option<serde_json::Value>> {
        let value: Option<Json<serde_json::Value>> =
            sqlx::query_scalar("SELECT value FROM site_settings WHERE key = $1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.map(|Json(v)| v))
    }

    async fn put(&self, key: &str, value: serde_json::Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO site_settings (key, value, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(key)
        .bind(Json(value))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM site_settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
