// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accounts;
pub mod password;
pub mod validation;

pub use accounts::{OAuthProfile, PasswordChange, ProfileUpdate, SignupRequest};
pub use password::{authenticate, hash_password};
pub use validation::{validate_user, ValidationError};
