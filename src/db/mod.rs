// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! `DocumentDb` is the storage handle threaded through the application. It is
//! constructed once at startup and cloned cheaply into request state.

pub mod firestore;
pub mod memory;

use std::sync::Arc;

pub use self::firestore::FirestoreStore;
pub use self::memory::MemoryStore;

use crate::error::AppError;
use crate::models::User;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Unique index on `users.username`
    pub const USERNAMES: &str = "usernames";
    /// Unique index on `users.email`
    pub const EMAILS: &str = "emails";
}

#[derive(Clone)]
enum Backend {
    Firestore(FirestoreStore),
    Memory(Arc<MemoryStore>),
}

/// Document database handle.
#[derive(Clone)]
pub struct DocumentDb {
    backend: Backend,
}

impl DocumentDb {
    /// Connect to Firestore.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        Ok(Self {
            backend: Backend::Firestore(FirestoreStore::new(project_id).await?),
        })
    }

    /// Create an in-memory store (tests and local runs).
    pub fn new_in_memory() -> Self {
        tracing::debug!("Using in-memory document store");
        Self {
            backend: Backend::Memory(Arc::new(MemoryStore::new())),
        }
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.get_user(id).await,
            Backend::Memory(store) => Ok(store.get_user(id)),
        }
    }

    /// Exact-match lookup on the unique username index.
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.find_user_by_username(username).await,
            Backend::Memory(store) => Ok(store.find_user_by_username(username)),
        }
    }

    /// Exact-match lookup on the unique email index.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.find_user_by_email(email).await,
            Backend::Memory(store) => Ok(store.find_user_by_email(email)),
        }
    }

    /// Find the user holding an OAuth identity (`provider_data[field] == value`).
    pub async fn find_user_by_provider(
        &self,
        provider: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.find_user_by_provider(provider, field, value).await,
            Backend::Memory(store) => Ok(store.find_user_by_provider(provider, field, value)),
        }
    }

    /// Persist a user as-is. Uniqueness violations surface as `AppError::Conflict`.
    ///
    /// Callers go through `services::accounts::save`, which validates and
    /// hashes first.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        match &self.backend {
            Backend::Firestore(store) => store.save_user(user).await,
            Backend::Memory(store) => store.save_user(user),
        }
    }
}
