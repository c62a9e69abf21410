// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account lifecycle: saving, sign-up/sign-in, profile and password changes,
//! and OAuth identity provisioning.
//!
//! Every write goes through [`save`], which validates the candidate record,
//! hashes a newly set password and only then hands the record to storage.

use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::DocumentDb;
use crate::error::{AppError, Result};
use crate::models::{Provider, ProviderData, User};
use crate::services::password::{authenticate, generate_salt, hash_password, MIN_PASSWORD_LENGTH};
use crate::services::validation::validate_user;

/// Random bytes in a generated user ID (hex encoded, 32 chars).
const USER_ID_BYTES: usize = 16;

/// Fallback base for generated usernames when a profile carries neither a
/// username nor an email local part.
const FALLBACK_USERNAME: &str = "user";

// ─── Request types ───────────────────────────────────────────

/// Local account sign-up.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Profile fields a user may change. Roles are deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub verify_password: String,
}

/// Normalized profile returned by an OAuth provider after code exchange.
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    /// Provider name, e.g. `google`
    pub provider: String,
    /// Key in `provider_data` that identifies the account at the provider
    pub identifier_field: String,
    pub provider_data: ProviderData,
    pub first_name: String,
    pub last_name: String,
    pub display_name: Option<String>,
    pub email: String,
    /// Preferred username, if the provider exposes one
    pub username: Option<String>,
}

impl OAuthProfile {
    /// The provider-side account identifier as a string.
    fn identifier(&self) -> Result<String> {
        match self.provider_data.get(&self.identifier_field) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => Ok(n.to_string()),
            _ => Err(AppError::BadRequest(format!(
                "{} profile has no {}",
                self.provider, self.identifier_field
            ))),
        }
    }

    /// Username to start allocation from.
    fn username_base(&self) -> String {
        let preferred = self
            .username
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let from_email = self
            .email
            .split('@')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        preferred
            .or(from_email)
            .unwrap_or(FALLBACK_USERNAME)
            .to_string()
    }
}

// ─── Pre-save transformation ─────────────────────────────────

/// Hash a newly set raw password under a fresh salt.
pub fn prepare_for_save(user: User) -> Result<User> {
    let salt = if needs_hashing(&user) {
        generate_salt()?
    } else {
        String::new()
    };
    Ok(prepare_for_save_with_salt(user, salt))
}

/// Deterministic core of [`prepare_for_save`].
///
/// A pending raw password longer than six characters replaces `password`
/// with its hash under `salt`; otherwise `password` and `salt` are left
/// untouched. The pending slot is always cleared.
pub fn prepare_for_save_with_salt(mut user: User, salt: String) -> User {
    if needs_hashing(&user) {
        if let Some(raw) = user.pending_password.take() {
            user.password = Some(hash_password(&raw, Some(&salt)));
            user.salt = Some(salt);
        }
    }
    user.pending_password = None;
    user
}

fn needs_hashing(user: &User) -> bool {
    user.pending_password
        .as_deref()
        .is_some_and(|raw| raw.chars().count() >= MIN_PASSWORD_LENGTH)
}

// ─── Persistence ─────────────────────────────────────────────

/// Validate, hash and store a user; returns the stored record.
///
/// A validation failure performs no write.
pub async fn save(db: &DocumentDb, user: User) -> Result<User> {
    validate_user(&user)?;
    let user = prepare_for_save(user)?;
    db.save_user(&user).await?;
    Ok(user)
}

/// Find the first free username among `base`, `base1`, `base2`, ...
///
/// Availability is only a snapshot; a concurrent claim is caught by the
/// uniqueness check when the record is saved.
pub async fn allocate_unique_username(db: &DocumentDb, base: &str) -> Result<String> {
    let mut suffix: u64 = 0;
    loop {
        let candidate = if suffix == 0 {
            base.to_string()
        } else {
            format!("{}{}", base, suffix)
        };

        if db.find_user_by_username(&candidate).await?.is_none() {
            tracing::debug!(base, username = %candidate, "Allocated username");
            return Ok(candidate);
        }

        suffix += 1;
    }
}

fn new_user_id() -> Result<String> {
    let mut bytes = [0u8; USER_ID_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode(bytes))
}

async fn load_user(db: &DocumentDb, user_id: &str) -> Result<User> {
    db.get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── Local accounts ──────────────────────────────────────────

/// Create a local account.
pub async fn sign_up(db: &DocumentDb, request: SignupRequest) -> Result<User> {
    let mut user = User::new(
        new_user_id()?,
        request.email.trim(),
        request.username.trim(),
        Provider::Local,
    );
    user.set_names(&request.first_name, &request.last_name);
    user.set_password(request.password);

    let user = save(db, user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
    Ok(user)
}

/// Verify a username/password pair.
pub async fn sign_in(db: &DocumentDb, username: &str, password: &str) -> Result<User> {
    let username = username.trim();
    let Some(user) = db.find_user_by_username(username).await? else {
        tracing::info!(username, "Sign-in for unknown user");
        return Err(AppError::Unauthorized);
    };

    if !authenticate(&user, password) {
        tracing::info!(user_id = %user.id, "Sign-in with wrong password");
        return Err(AppError::Unauthorized);
    }

    tracing::info!(user_id = %user.id, "User signed in");
    Ok(user)
}

/// Apply a profile update and stamp `updated`.
pub async fn update_profile(db: &DocumentDb, user_id: &str, update: ProfileUpdate) -> Result<User> {
    let mut user = load_user(db, user_id).await?;

    let first_name = update.first_name.unwrap_or_else(|| user.first_name.clone());
    let last_name = update.last_name.unwrap_or_else(|| user.last_name.clone());
    user.set_names(&first_name, &last_name);

    if let Some(email) = update.email {
        user.email = email.trim().to_string();
    }
    if let Some(username) = update.username {
        user.username = username.trim().to_string();
    }
    user.touch();

    let user = save(db, user).await?;
    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(user)
}

/// Change the password after checking the current one.
pub async fn change_password(db: &DocumentDb, user_id: &str, change: PasswordChange) -> Result<()> {
    if change.new_password.is_empty() {
        return Err(AppError::BadRequest("New password is required".to_string()));
    }

    let mut user = load_user(db, user_id).await?;

    if !authenticate(&user, &change.current_password) {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    if change.new_password != change.verify_password {
        return Err(AppError::BadRequest("Passwords do not match".to_string()));
    }

    user.set_password(change.new_password);
    user.touch();
    save(db, user).await?;

    tracing::info!(user_id, "Password changed");
    Ok(())
}

// ─── OAuth identities ────────────────────────────────────────

/// Return the user owning an OAuth identity, creating one on first sign-in.
pub async fn provision_oauth_user(db: &DocumentDb, profile: OAuthProfile) -> Result<User> {
    let identifier = profile.identifier()?;

    if let Some(existing) = db
        .find_user_by_provider(&profile.provider, &profile.identifier_field, &identifier)
        .await?
    {
        tracing::debug!(user_id = %existing.id, provider = %profile.provider, "Existing OAuth user");
        return Ok(existing);
    }

    let username = allocate_unique_username(db, &profile.username_base()).await?;

    let mut user = User::new(
        new_user_id()?,
        profile.email.trim(),
        username,
        Provider::from(profile.provider.as_str()),
    );
    user.set_names(&profile.first_name, &profile.last_name);
    if let Some(display_name) = profile.display_name.filter(|d| !d.trim().is_empty()) {
        user.display_name = display_name.trim().to_string();
    }
    user.provider_data = profile.provider_data;

    let user = save(db, user).await?;
    tracing::info!(
        user_id = %user.id,
        provider = %user.provider,
        username = %user.username,
        "OAuth user provisioned"
    );
    Ok(user)
}

/// Attach an OAuth identity to an existing account.
///
/// A provider already linked (as primary or additional) is left as is.
pub async fn link_oauth_provider(
    db: &DocumentDb,
    user_id: &str,
    profile: OAuthProfile,
) -> Result<User> {
    let mut user = load_user(db, user_id).await?;

    if user.has_provider(&profile.provider) {
        return Ok(user);
    }

    user.additional_providers_data
        .insert(profile.provider.clone(), profile.provider_data);

    let user = save(db, user).await?;
    tracing::info!(user_id, provider = %profile.provider, "OAuth provider linked");
    Ok(user)
}

/// Detach an additional OAuth identity. Unknown providers are a no-op.
pub async fn remove_oauth_provider(db: &DocumentDb, user_id: &str, provider: &str) -> Result<User> {
    if provider.trim().is_empty() {
        return Err(AppError::BadRequest("Invalid provider".to_string()));
    }

    let mut user = load_user(db, user_id).await?;

    if user.additional_providers_data.remove(provider).is_none() {
        return Ok(user);
    }

    let user = save(db, user).await?;
    tracing::info!(user_id, provider, "OAuth provider removed");
    Ok(user)
}
