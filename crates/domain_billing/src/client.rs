//! Client records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::ClientId;

use crate::invoice::ClientSnapshot;

/// A billed customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Free-form postal address as printed on invoices
    pub address: Option<String>,
    /// Deactivated clients keep their invoice history
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Copies the fields an invoice denormalizes at creation time
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            name: self.name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
        }
    }
}

/// Data for creating a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl NewClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
            phone: None,
            address: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn into_client(self, now: DateTime<Utc>) -> Client {
        Client {
            id: ClientId::new_v7(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a client; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl ClientPatch {
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }

    pub fn apply(self, client: &mut Client, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            client.name = name;
        }
        if let Some(email) = self.email {
            client.email = Some(email);
        }
        if let Some(phone) = self.phone {
            client.phone = Some(phone);
        }
        if let Some(address) = self.address {
            client.address = Some(address);
        }
        if let Some(active) = self.is_active {
            client.is_active = active;
        }
        client.updated_at = now;
    }
}
