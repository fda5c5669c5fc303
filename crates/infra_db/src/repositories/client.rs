//! Client repository

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

const CLIENT_COLUMNS: &str =
    "client_id, name, email, phone, address, is_active, created_at, updated_at";

/// A row of the `clients` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ClientRow {
    pub client_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &ClientRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO clients (
                client_id, name, email, phone, address, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.client_id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.address)
        .bind(row.is_active)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, client_id: Uuid) -> Result<ClientRow, DatabaseError> {
        Self::fetch(&self.pool, client_id, false).await
    }

    /// Reads a client, row-locking it when `for_update` is set
    pub async fn fetch<'e>(
        executor: impl PgExecutor<'e>,
        client_id: Uuid,
        for_update: bool,
    ) -> Result<ClientRow, DatabaseError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE client_id = $1{lock}"
        ))
        .bind(client_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Client", client_id))
    }

    pub async fn list(&self) -> Result<Vec<ClientRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at, client_id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Overwrites every mutable column of the client
    pub async fn update<'e>(executor: impl PgExecutor<'e>, row: &ClientRow) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE clients
               SET name = $2, email = $3, phone = $4, address = $5,
                   is_active = $6, updated_at = $7
             WHERE client_id = $1
            "#,
        )
        .bind(row.client_id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.address)
        .bind(row.is_active)
        .bind(row.updated_at)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Client", row.client_id));
        }
        Ok(())
    }
}
