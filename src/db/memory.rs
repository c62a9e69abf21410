// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store for tests and local runs.
//!
//! Mirrors the Firestore layout: a `users` map plus one unique index per
//! constrained field, each mapping the indexed value to the owning user ID.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AppError;
use crate::models::{ProviderData, User};

enum Claim {
    /// The key was vacant and now belongs to the user.
    New,
    /// The key already belonged to the user.
    Held,
    /// The key belongs to another user.
    Taken,
}

/// In-memory users collection with unique username and email indexes.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    usernames: DashMap<String, String>,
    emails: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_user(&self, id: &str) -> Option<User> {
        self.users.get(id).map(|user| user.clone())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        let id = self.usernames.get(username)?.clone();
        self.get_user(&id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let id = self.emails.get(email)?.clone();
        self.get_user(&id)
    }

    /// Find the user whose primary or additional provider data carries
    /// `field == value` for `provider`.
    pub fn find_user_by_provider(&self, provider: &str, field: &str, value: &str) -> Option<User> {
        self.users
            .iter()
            .find(|entry| {
                let user = entry.value();
                let primary =
                    user.provider.as_str() == provider && field_matches(&user.provider_data, field, value);
                let additional = user
                    .additional_providers_data
                    .get(provider)
                    .is_some_and(|data| field_matches(data, field, value));
                primary || additional
            })
            .map(|entry| entry.value().clone())
    }

    /// Insert or replace a user, enforcing username and email uniqueness.
    pub fn save_user(&self, user: &User) -> Result<(), AppError> {
        let previous = self.get_user(&user.id);

        let username_claim = claim(&self.usernames, &user.username, &user.id);
        if matches!(username_claim, Claim::Taken) {
            return Err(AppError::Conflict("username".to_string()));
        }

        if matches!(claim(&self.emails, &user.email, &user.id), Claim::Taken) {
            if matches!(username_claim, Claim::New) {
                release(&self.usernames, &user.username, &user.id);
            }
            return Err(AppError::Conflict("email".to_string()));
        }

        if let Some(previous) = previous {
            if previous.username != user.username {
                release(&self.usernames, &previous.username, &user.id);
            }
            if previous.email != user.email {
                release(&self.emails, &previous.email, &user.id);
            }
        }

        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn claim(index: &DashMap<String, String>, key: &str, user_id: &str) -> Claim {
    match index.entry(key.to_string()) {
        Entry::Occupied(entry) if entry.get() == user_id => Claim::Held,
        Entry::Occupied(_) => Claim::Taken,
        Entry::Vacant(entry) => {
            entry.insert(user_id.to_string());
            Claim::New
        }
    }
}

fn release(index: &DashMap<String, String>, key: &str, user_id: &str) {
    index.remove_if(key, |_, owner| owner == user_id);
}

fn field_matches(data: &ProviderData, field: &str, value: &str) -> bool {
    match data.get(field) {
        Some(serde_json::Value::String(s)) => s == value,
        Some(serde_json::Value::Number(n)) => n.to_string() == value,
        _ => false,
    }
}
