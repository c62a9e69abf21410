// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Record validation run before every save.

use validator::ValidateEmail;

use crate::models::User;
use crate::services::password::MIN_PASSWORD_LENGTH;

/// The specific constraint a candidate record violates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("email is required")]
    MissingEmail,

    #[error("email is not a valid address")]
    InvalidEmail,

    #[error("username is required")]
    MissingUsername,

    #[error("password is required for local accounts")]
    MissingPassword,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("first name is required")]
    MissingFirstName,

    #[error("last name is required")]
    MissingLastName,

    #[error("at least one role is required")]
    EmptyRoles,
}

/// Validate the whole candidate record.
///
/// Local accounts need a password (a staged raw one must meet the minimum
/// length) and both name parts. OAuth accounts need names only once the
/// record has been updated.
pub fn validate_user(user: &User) -> Result<(), ValidationError> {
    if user.email.trim().is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    if !user.email.validate_email() {
        return Err(ValidationError::InvalidEmail);
    }
    if user.username.trim().is_empty() {
        return Err(ValidationError::MissingUsername);
    }

    let local = user.provider.is_local();

    if local {
        match user.pending_password.as_deref() {
            Some(raw) if raw.chars().count() < MIN_PASSWORD_LENGTH => {
                return Err(ValidationError::PasswordTooShort);
            }
            Some(_) => {}
            None if user.password.as_deref().map_or(true, str::is_empty) => {
                return Err(ValidationError::MissingPassword);
            }
            None => {}
        }
    }

    if local || user.has_been_updated() {
        if user.first_name.trim().is_empty() {
            return Err(ValidationError::MissingFirstName);
        }
        if user.last_name.trim().is_empty() {
            return Err(ValidationError::MissingLastName);
        }
    }

    if user.roles.is_empty() {
        return Err(ValidationError::EmptyRoles);
    }

    Ok(())
}
