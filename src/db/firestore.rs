// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Firestore has no unique indexes, so each unique user field is backed by a
//! guard collection (`usernames`, `emails`) whose document ID is the
//! url-encoded value behind a fixed prefix. Guards are created with an `Exists(false)` precondition
//! in the same transaction as the user document, so a racing writer fails at
//! commit time.

use firestore::errors::FirestoreError;
use firestore::{FirestoreTransaction, FirestoreWritePrecondition};
use serde::{Deserialize, Serialize};

use crate::db::collections;
use crate::error::AppError;
use crate::models::User;

/// Guard document owning one unique value.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    user_id: String,
}

/// Document ID for a guarded value. The prefix keeps values like `..` or
/// `__name__` clear of Firestore's reserved IDs.
fn guard_id(value: &str) -> String {
    format!("v-{}", urlencoding::encode(value))
}

fn db_error(e: FirestoreError) -> AppError {
    AppError::Database(e.to_string())
}

/// Firestore-backed users collection.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Lookups ─────────────────────────────────────────────────

    /// Get a user by document ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(id)
            .await
            .map_err(db_error)
    }

    /// Exact-match lookup on a top-level or dotted field path, first hit only.
    async fn find_one_where(&self, field: String, value: String) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field(field.as_str()).eq(value.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_error)?;
        Ok(users.into_iter().next())
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        self.find_one_where("username".to_string(), username.to_string())
            .await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.find_one_where("email".to_string(), email.to_string())
            .await
    }

    /// Find the user linked to an OAuth identity, as primary or additional provider.
    pub async fn find_user_by_provider(
        &self,
        provider: &str,
        field: &str,
        value: &str,
    ) -> Result<Option<User>, AppError> {
        let provider_owned = provider.to_string();
        let data_path = format!("provider_data.{}", field);
        let id_value = value.to_string();

        let primary: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| {
                q.for_all([
                    q.field("provider").eq(provider_owned.clone()),
                    q.field(data_path.as_str()).eq(id_value.clone()),
                ])
            })
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(db_error)?;

        if let Some(user) = primary.into_iter().next() {
            return Ok(Some(user));
        }

        self.find_one_where(
            format!("additional_providers_data.{}.{}", provider, field),
            value.to_string(),
        )
        .await
    }

    // ─── Writes ──────────────────────────────────────────────────

    /// Fail early with the offending field if a guard is held by another user.
    async fn ensure_unclaimed(
        &self,
        collection: &str,
        value: &str,
        user_id: &str,
        field: &str,
    ) -> Result<(), AppError> {
        let entry: Option<IndexEntry> = self
            .client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(&guard_id(value))
            .await
            .map_err(db_error)?;

        match entry {
            Some(entry) if entry.user_id != user_id => Err(AppError::Conflict(field.to_string())),
            _ => Ok(()),
        }
    }

    fn claim_in_transaction(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        collection: &str,
        value: &str,
        user_id: &str,
    ) -> Result<(), AppError> {
        let entry = IndexEntry {
            user_id: user_id.to_string(),
        };
        self.client
            .fluent()
            .update()
            .in_col(collection)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(guard_id(value))
            .object(&entry)
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} guard to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    fn release_in_transaction(
        &self,
        transaction: &mut FirestoreTransaction<'_>,
        collection: &str,
        value: &str,
    ) -> Result<(), AppError> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(guard_id(value))
            .add_to_transaction(transaction)
            .map_err(|e| {
                AppError::Database(format!(
                    "Failed to add {} guard release to transaction: {}",
                    collection, e
                ))
            })?;
        Ok(())
    }

    /// Create or replace a user, claiming its username and email atomically.
    pub async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let previous = self.get_user(&user.id).await?;
        let username_changed = previous
            .as_ref()
            .map_or(true, |p| p.username != user.username);
        let email_changed = previous.as_ref().map_or(true, |p| p.email != user.email);

        if username_changed {
            self.ensure_unclaimed(collections::USERNAMES, &user.username, &user.id, "username")
                .await?;
        }
        if email_changed {
            self.ensure_unclaimed(collections::EMAILS, &user.email, &user.id, "email")
                .await?;
        }

        let mut transaction = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        if username_changed {
            self.claim_in_transaction(
                &mut transaction,
                collections::USERNAMES,
                &user.username,
                &user.id,
            )?;
            if let Some(previous) = &previous {
                self.release_in_transaction(
                    &mut transaction,
                    collections::USERNAMES,
                    &previous.username,
                )?;
            }
        }

        if email_changed {
            self.claim_in_transaction(&mut transaction, collections::EMAILS, &user.email, &user.id)?;
            if let Some(previous) = &previous {
                self.release_in_transaction(&mut transaction, collections::EMAILS, &previous.email)?;
            }
        }

        self.client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction.commit().await.map_err(|e| match e {
            FirestoreError::DataConflictError(_) => {
                AppError::Conflict("username or email".to_string())
            }
            other => AppError::Database(format!("Transaction commit failed: {}", other)),
        })?;

        tracing::debug!(user_id = %user.id, username = %user.username, "User saved");

        Ok(())
    }
}
