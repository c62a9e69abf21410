// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::{now_rfc3339, stamp_after};

/// Opaque provider payload returned by an OAuth exchange.
pub type ProviderData = BTreeMap<String, serde_json::Value>;

/// Account role. Unknown role names fail deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
pub enum Role {
    User,
    Admin,
}

/// Origin of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provider {
    /// Username + password account.
    Local,
    /// External OAuth issuer, e.g. `google` or `linkedin`.
    OAuth(String),
}

impl Provider {
    pub const LOCAL: &'static str = "local";

    pub fn is_local(&self) -> bool {
        matches!(self, Provider::Local)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Provider::Local => Self::LOCAL,
            Provider::OAuth(name) => name,
        }
    }
}

impl From<String> for Provider {
    fn from(value: String) -> Self {
        if value == Self::LOCAL {
            Provider::Local
        } else {
            Provider::OAuth(value)
        }
    }
}

impl From<&str> for Provider {
    fn from(value: &str) -> Self {
        Provider::from(value.to_string())
    }
}

impl From<Provider> for String {
    fn from(value: Provider) -> Self {
        match value {
            Provider::Local => Provider::LOCAL.to_string(),
            Provider::OAuth(name) => name,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_roles() -> BTreeSet<Role> {
    BTreeSet::from([Role::User])
}

/// User account stored in the `users` collection.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Document ID
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub display_name: String,
    pub email: String,
    pub username: String,
    /// PBKDF2 hash of the password (never the raw value once saved)
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub salt: Option<String>,
    pub provider: Provider,
    #[serde(default)]
    pub provider_data: ProviderData,
    #[serde(default)]
    pub additional_providers_data: BTreeMap<String, ProviderData>,
    #[serde(default = "default_roles")]
    pub roles: BTreeSet<Role>,
    /// Last update (RFC3339), equal to `created` until the first update
    pub updated: String,
    /// Creation time (RFC3339)
    pub created: String,
    #[serde(default)]
    pub reset_password_token: Option<String>,
    #[serde(default)]
    pub reset_password_expires: Option<String>,
    /// Raw password set since the last save, hashed by `prepare_for_save`.
    #[serde(skip)]
    pub pending_password: Option<String>,
}

impl User {
    /// Build a new, unsaved record with creation defaults.
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        username: impl Into<String>,
        provider: Provider,
    ) -> Self {
        let now = now_rfc3339();
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            display_name: String::new(),
            email: email.into(),
            username: username.into(),
            password: None,
            salt: None,
            provider,
            provider_data: ProviderData::new(),
            additional_providers_data: BTreeMap::new(),
            roles: default_roles(),
            updated: now.clone(),
            created: now,
            reset_password_token: None,
            reset_password_expires: None,
            pending_password: None,
        }
    }

    /// Stage a raw password; it is hashed on the next save.
    pub fn set_password(&mut self, raw: impl Into<String>) {
        self.pending_password = Some(raw.into());
    }

    /// Set both name parts and recompute the display name.
    pub fn set_names(&mut self, first_name: &str, last_name: &str) {
        self.first_name = first_name.trim().to_string();
        self.last_name = last_name.trim().to_string();
        self.display_name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
    }

    /// Stamp the record as updated now, strictly after `created`.
    pub fn touch(&mut self) {
        self.updated = stamp_after(&self.created);
    }

    /// Whether the record has been updated since creation.
    pub fn has_been_updated(&self) -> bool {
        self.updated > self.created
    }

    /// Whether the account was linked to the given provider, either as its
    /// primary identity or as an additional one.
    pub fn has_provider(&self, provider: &str) -> bool {
        self.provider.as_str() == provider || self.additional_providers_data.contains_key(provider)
    }

    /// Sanitized view for API responses.
    pub fn public_view(&self) -> UserResponse {
        UserResponse {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            provider: self.provider.to_string(),
            additional_providers: self.additional_providers_data.keys().cloned().collect(),
            roles: self.roles.iter().copied().collect(),
            updated: self.updated.clone(),
            created: self.created.clone(),
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("username", &self.username)
            .field("provider", &self.provider)
            .field("roles", &self.roles)
            .field("updated", &self.updated)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// User as returned by the API (no password material or provider blobs).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub email: String,
    pub username: String,
    pub provider: String,
    pub additional_providers: Vec<String>,
    pub roles: Vec<Role>,
    pub updated: String,
    pub created: String,
}
