//! PostgreSQL client adapter

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{ClientId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::{Client, ClientPatch, ClientPort, NewClient};

use super::database_health;
use crate::error::DatabaseError;
use crate::repositories::{ClientRepository, ClientRow};

/// PostgreSQL-backed implementation of [`ClientPort`]
///
/// Updates lock the row, apply the patch in the domain and write the result
/// back inside one transaction.
#[derive(Debug, Clone)]
pub struct PostgresClientAdapter {
    repository: ClientRepository,
    pool: PgPool,
}

impl PostgresClientAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClientRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &ClientRepository {
        &self.repository
    }
}

fn to_row(client: &Client) -> ClientRow {
    ClientRow {
        client_id: *client.id.as_uuid(),
        name: client.name.clone(),
        email: client.email.clone(),
        phone: client.phone.clone(),
        address: client.address.clone(),
        is_active: client.is_active,
        created_at: client.created_at,
        updated_at: client.updated_at,
    }
}

fn from_row(row: ClientRow) -> Client {
    Client {
        id: ClientId::from_uuid(row.client_id),
        name: row.name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        is_active: row.is_active,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

impl DomainPort for PostgresClientAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClientAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        database_health(&self.pool, "postgres-client-adapter").await
    }
}

#[async_trait]
impl ClientPort for PostgresClientAdapter {
    #[instrument(skip(self, client))]
    async fn create(&self, client: NewClient) -> Result<Client, PortError> {
        let client = client.into_client(Utc::now());
        self.repository.insert(&to_row(&client)).await?;
        debug!(client_id = %client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self), fields(client_id = %id))]
    async fn get(&self, id: ClientId) -> Result<Client, PortError> {
        let row = self.repository.get(*id.as_uuid()).await?;
        Ok(from_row(row))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Client>, PortError> {
        let rows = self.repository.list().await?;
        Ok(rows.into_iter().map(from_row).collect())
    }

    #[instrument(skip(self, patch), fields(client_id = %id))]
    async fn update(&self, id: ClientId, patch: ClientPatch) -> Result<Client, PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        let row = ClientRepository::fetch(&mut *tx, *id.as_uuid(), true).await?;
        let mut client = from_row(row);
        patch.apply(&mut client, Utc::now());
        ClientRepository::update(&mut *tx, &to_row(&client)).await?;

        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_conversion_keeps_every_field() {
        let client = NewClient::new("Acme Ltd")
            .with_email("ap@acme.test")
            .with_address("1 Main St")
            .into_client(Utc::now());

        assert_eq!(from_row(to_row(&client)), client);
    }
}
