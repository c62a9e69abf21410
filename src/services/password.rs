// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing and verification.
//!
//! Hashes are PBKDF2-HMAC-SHA1 with 10,000 iterations and a 64-byte output,
//! stored as standard base64. The salt is a base64 string of 16 random bytes
//! whose UTF-8 bytes feed the key derivation, so records written by the
//! previous Node deployment keep verifying.

use std::num::NonZeroU32;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::models::User;

/// Minimum raw password length accepted for local accounts.
pub const MIN_PASSWORD_LENGTH: usize = 7;

const PBKDF2_ITERATIONS: NonZeroU32 = match NonZeroU32::new(10_000) {
    Some(n) => n,
    None => unreachable!(),
};
const HASH_LEN: usize = 64;
const SALT_LEN: usize = 16;
static PBKDF2_ALG: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA1;

/// Hash `raw` with `salt`.
///
/// Without a salt (or with an empty input) the input is returned unchanged;
/// OAuth-provisioned accounts carry no salt and no local password.
pub fn hash_password(raw: &str, salt: Option<&str>) -> String {
    match salt {
        Some(salt) if !salt.is_empty() && !raw.is_empty() => {
            let mut out = [0u8; HASH_LEN];
            pbkdf2::derive(
                PBKDF2_ALG,
                PBKDF2_ITERATIONS,
                salt.as_bytes(),
                raw.as_bytes(),
                &mut out,
            );
            BASE64.encode(out)
        }
        _ => raw.to_string(),
    }
}

/// Generate a fresh per-user salt from the system CSPRNG.
pub fn generate_salt() -> Result<String, AppError> {
    let mut bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(BASE64.encode(bytes))
}

/// Check a candidate password against the stored hash.
///
/// A wrong password is `false`, never an error.
pub fn authenticate(user: &User, candidate: &str) -> bool {
    let Some(stored) = user.password.as_deref() else {
        return false;
    };
    let computed = hash_password(candidate, user.salt.as_deref());
    computed.as_bytes().ct_eq(stored.as_bytes()).into()
}
