//! Settings resolvers
//!
//! Settings live in the key-value [`SettingsPort`] as JSON documents. The
//! resolvers decode them into typed values, fill gaps from defaults, and
//! cache what they successfully read. Each resolver owns its cache; callers
//! share a resolver through an `Arc` and call `invalidate` after out-of-band
//! writes.
//!
//! Reads never fail: a store outage or a malformed document is logged and
//! answered with the defaults, which are not cached so the next read tries
//! the store again.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};

use core_kernel::Currency;

use crate::error::BillingError;
use crate::numbering::{DocumentType, NumberingSettings, NumberingSettingsPatch};
use crate::ports::SettingsPort;
use crate::template::PaymentTerms;

pub const NUMBERING_CATEGORY: &str = "numbering";
pub const GENERAL_CATEGORY: &str = "general";
pub const GENERAL_SETTINGS_KEY: &str = "settings.general";

/// Resolves per-document-type numbering settings
pub struct NumberingSettingsResolver {
    store: Arc<dyn SettingsPort>,
    cache: RwLock<HashMap<DocumentType, NumberingSettings>>,
}

impl NumberingSettingsResolver {
    pub fn new(store: Arc<dyn SettingsPort>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Settings for the type, persisted fields merged over the type defaults
    #[instrument(skip(self), fields(document_type = %document_type))]
    pub async fn get(&self, document_type: DocumentType) -> NumberingSettings {
        if let Some(settings) = self.cache.read().await.get(&document_type) {
            return settings.clone();
        }

        match self.load(document_type).await {
            Ok(settings) => {
                self.cache.write().await.insert(document_type, settings.clone());
                settings
            }
            Err(e) => {
                error!(
                    document_type = %document_type,
                    error = %e,
                    "Failed to load numbering settings, using defaults"
                );
                NumberingSettings::defaults_for(document_type)
            }
        }
    }

    /// Persists settings for the type and refreshes the cache
    #[instrument(skip(self, settings), fields(document_type = %document_type))]
    pub async fn set(&self, document_type: DocumentType, settings: NumberingSettings) -> Result<(), BillingError> {
        settings.validate()?;
        let value = serde_json::to_value(&settings)
            .map_err(|e| BillingError::validation(format!("unencodable numbering settings: {e}")))?;
        self.store
            .set(&document_type.settings_key(), value, NUMBERING_CATEGORY)
            .await?;
        self.cache.write().await.insert(document_type, settings);
        debug!("Numbering settings saved");
        Ok(())
    }

    /// Drops every cached entry
    pub async fn invalidate(&self) {
        self.cache.write().await.clear();
    }

    async fn load(&self, document_type: DocumentType) -> Result<NumberingSettings, BillingError> {
        let defaults = NumberingSettings::defaults_for(document_type);
        match self.store.get(&document_type.settings_key()).await? {
            None => Ok(defaults),
            Some(value) => {
                let patch: NumberingSettingsPatch = serde_json::from_value(value).map_err(|e| {
                    BillingError::validation(format!("malformed numbering settings: {e}"))
                })?;
                Ok(patch.apply_to(defaults))
            }
        }
    }
}

/// How dates are rendered for people
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
    #[serde(rename = "MM/DD/YYYY")]
    UsSlash,
    #[serde(rename = "DD/MM/YYYY")]
    EuSlash,
}

impl DateFormat {
    pub fn format(&self, date: NaiveDate) -> String {
        let pattern = match self {
            DateFormat::Iso => "%Y-%m-%d",
            DateFormat::UsSlash => "%m/%d/%Y",
            DateFormat::EuSlash => "%d/%m/%Y",
        };
        date.format(pattern).to_string()
    }
}

/// Business-wide preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneralSettings {
    /// Currency of new invoices, templates, payments and expenses
    pub currency: Currency,
    pub date_format: DateFormat,
    pub default_payment_terms: PaymentTerms,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            currency: Currency::USD,
            date_format: DateFormat::Iso,
            default_payment_terms: PaymentTerms::Net30,
        }
    }
}

/// Resolves [`GeneralSettings`] with the same fallback rules as numbering
pub struct GeneralSettingsResolver {
    store: Arc<dyn SettingsPort>,
    cache: RwLock<Option<GeneralSettings>>,
}

impl GeneralSettingsResolver {
    pub fn new(store: Arc<dyn SettingsPort>) -> Self {
        Self {
            store,
            cache: RwLock::new(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self) -> GeneralSettings {
        if let Some(settings) = self.cache.read().await.as_ref() {
            return settings.clone();
        }

        match self.load().await {
            Ok(settings) => {
                *self.cache.write().await = Some(settings.clone());
                settings
            }
            Err(e) => {
                error!(error = %e, "Failed to load general settings, using defaults");
                GeneralSettings::default()
            }
        }
    }

    #[instrument(skip(self, settings))]
    pub async fn set(&self, settings: GeneralSettings) -> Result<(), BillingError> {
        let value = serde_json::to_value(&settings)
            .map_err(|e| BillingError::validation(format!("unencodable general settings: {e}")))?;
        self.store.set(GENERAL_SETTINGS_KEY, value, GENERAL_CATEGORY).await?;
        *self.cache.write().await = Some(settings);
        Ok(())
    }

    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn load(&self) -> Result<GeneralSettings, BillingError> {
        match self.store.get(GENERAL_SETTINGS_KEY).await? {
            None => Ok(GeneralSettings::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| BillingError::validation(format!("malformed general settings: {e}"))),
        }
    }
}
