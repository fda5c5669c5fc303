//! API configuration

use serde::Deserialize;

use core_kernel::Timezone;
use domain_billing::CatchUpPolicy;

/// API configuration
///
/// Loaded from `API_`-prefixed environment variables; every field has a
/// default so a bare environment starts a local server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    pub max_db_connections: u32,
    /// Seconds between recurring runs; 0 disables the scheduler
    pub recurring_interval_secs: u64,
    /// IANA zone that decides what "today" is
    pub timezone: Timezone,
    /// Periods a lagging template may catch up in one run; 0 means one
    pub catch_up_max_periods: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/billing".to_string(),
            log_level: "info".to_string(),
            max_db_connections: 10,
            recurring_interval_secs: 3600,
            timezone: Timezone::default(),
            catch_up_max_periods: 0,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn catch_up_policy(&self) -> CatchUpPolicy {
        CatchUpPolicy::from_max_periods(self.catch_up_max_periods)
    }

    /// Interval of the background recurring run, `None` when disabled
    pub fn recurring_interval(&self) -> Option<std::time::Duration> {
        (self.recurring_interval_secs > 0)
            .then(|| std::time::Duration::from_secs(self.recurring_interval_secs))
    }
}
