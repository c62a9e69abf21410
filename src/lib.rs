// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Account-Kit: user accounts for a document-backed web application
//!
//! This crate provides the HTTP backend: local sign-up and sign-in with
//! PBKDF2 password hashing, session cookies, OAuth identity provisioning,
//! and static asset serving on top of a Firestore document store.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod tls;

use config::Config;
use db::DocumentDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: DocumentDb,
}
