//! PostgreSQL settings adapter

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::SettingsPort;

use super::database_health;
use crate::repositories::SettingsRepository;

#[derive(Debug, Clone)]
pub struct PostgresSettingsAdapter {
    repository: SettingsRepository,
    pool: PgPool,
}

impl PostgresSettingsAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: SettingsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Every key and value stored under a category
    pub async fn list_category(
        &self,
        category: &str,
    ) -> Result<Vec<(String, serde_json::Value)>, PortError> {
        Ok(self.repository.list_category(category).await?)
    }
}

impl DomainPort for PostgresSettingsAdapter {}

#[async_trait]
impl HealthCheckable for PostgresSettingsAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-settings-adapter").await
    }
}

#[async_trait]
impl SettingsPort for PostgresSettingsAdapter {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, PortError> {
        Ok(self.repository.get(key).await?)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: serde_json::Value, category: &str) -> Result<(), PortError> {
        self.repository.upsert(key, &value, category).await?;
        Ok(())
    }
}
