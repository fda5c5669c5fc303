//! Database Test Utilities
//!
//! Two ways to back a [`BillingService`] in tests: a throwaway PostgreSQL
//! container with the workspace migrations applied, or the in-memory mock
//! ports with a pinned clock.

use chrono::NaiveDate;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

use core_kernel::FixedClock;
use domain_billing::ports::mock::{
    MockClientPort, MockExpensePort, MockInvoicePort, MockPaymentPort, MockSettingsPort, MockTemplatePort,
};
use domain_billing::{BillingPorts, BillingService};
use infra_db::{
    create_pool, run_migrations, DatabaseConfig, PostgresClientAdapter, PostgresExpenseAdapter,
    PostgresInvoiceAdapter, PostgresPaymentAdapter, PostgresSettingsAdapter, PostgresTemplateAdapter,
};

const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "billing_test";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Configuration for test database
#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A migrated PostgreSQL test container
pub struct TestDatabase {
    _container: ContainerAsync<Postgres>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies the workspace migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start or a migration fails
    pub async fn new() -> Result<Self, BoxError> {
        let container = Postgres::default()
            .with_db_name(POSTGRES_DB)
            .with_user(POSTGRES_USER)
            .with_password(POSTGRES_PASSWORD)
            .with_tag(POSTGRES_TAG)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = create_pool(
            DatabaseConfig::new(config.connection_url())
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(30)),
        )
        .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Postgres adapters for every billing port
    pub fn ports(&self) -> BillingPorts {
        BillingPorts {
            clients: Arc::new(PostgresClientAdapter::new(self.pool.clone())),
            invoices: Arc::new(PostgresInvoiceAdapter::new(self.pool.clone())),
            templates: Arc::new(PostgresTemplateAdapter::new(self.pool.clone())),
            payments: Arc::new(PostgresPaymentAdapter::new(self.pool.clone())),
            expenses: Arc::new(PostgresExpenseAdapter::new(self.pool.clone())),
            settings: Arc::new(PostgresSettingsAdapter::new(self.pool.clone())),
        }
    }

    /// A service over the Postgres adapters with the clock pinned to `today`
    pub fn service_on(&self, today: NaiveDate) -> BillingService {
        BillingService::new(self.ports(), FixedClock::shared(today))
    }

}

/// Creates an isolated test database for a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, BoxError> {
    TestDatabase::new().await
}

/// In-memory ports plus a service whose clock is pinned to `today`
///
/// The individual mocks stay reachable so tests can seed data or inject
/// failures behind the service's back.
pub struct InMemoryBilling {
    pub today: NaiveDate,
    pub clients: Arc<MockClientPort>,
    pub invoices: Arc<MockInvoicePort>,
    pub templates: Arc<MockTemplatePort>,
    pub payments: Arc<MockPaymentPort>,
    pub expenses: Arc<MockExpensePort>,
    pub settings: Arc<MockSettingsPort>,
    pub service: BillingService,
}

impl InMemoryBilling {
    pub fn on(today: NaiveDate) -> Self {
        let clients = Arc::new(MockClientPort::new());
        let invoices = Arc::new(MockInvoicePort::new());
        let templates = Arc::new(MockTemplatePort::new());
        let payments = Arc::new(MockPaymentPort::new());
        let expenses = Arc::new(MockExpensePort::new());
        let settings = Arc::new(MockSettingsPort::new());

        let ports = BillingPorts {
            clients: clients.clone(),
            invoices: invoices.clone(),
            templates: templates.clone(),
            payments: payments.clone(),
            expenses: expenses.clone(),
            settings: settings.clone(),
        };

        Self {
            today,
            clients,
            invoices,
            templates,
            payments,
            expenses,
            settings,
            service: BillingService::new(ports, FixedClock::shared(today)),
        }
    }

    /// A second service over the same stores, with the clock moved to `today`
    pub fn service_on(&self, today: NaiveDate) -> BillingService {
        let ports = BillingPorts {
            clients: self.clients.clone(),
            invoices: self.invoices.clone(),
            templates: self.templates.clone(),
            payments: self.payments.clone(),
            expenses: self.expenses.clone(),
            settings: self.settings.clone(),
        };
        BillingService::new(ports, FixedClock::shared(today))
    }
}

/// Helper macro for tests that need their own migrated database
///
/// Container tests need Docker, so they are ignored by default.
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires docker"]
        async fn $name() {
            let $db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let url = TestDatabaseConfig::default().connection_url();

        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with("/billing_test"));
    }

    #[tokio::test]
    async fn test_in_memory_services_share_stores() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let billing = InMemoryBilling::on(day);
        billing
            .service
            .create_client(domain_billing::NewClient::new("Acme Corp"))
            .await
            .unwrap();

        let later = billing.service_on(day.succ_opt().unwrap());
        assert_eq!(later.list_clients().await.unwrap().len(), 1);
    }
}
