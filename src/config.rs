// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Name of the session cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime (one day).
pub const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

/// Deployment mode selecting logging, caching and transport behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Verbose human-readable logs, static assets never cached.
    #[default]
    Development,
    /// JSON logs, static assets cached by clients.
    Production,
    /// Production behaviour served over HTTPS.
    Secure,
}

impl DeploymentMode {
    /// Whether the server terminates TLS itself.
    pub fn is_secure(self) -> bool {
        matches!(self, DeploymentMode::Secure)
    }

    /// Whether logs and caching follow the development profile.
    pub fn is_development(self) -> bool {
        matches!(self, DeploymentMode::Development)
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(DeploymentMode::Development),
            "production" | "prod" => Ok(DeploymentMode::Production),
            "secure" => Ok(DeploymentMode::Secure),
            other => Err(ConfigError::Invalid("APP_ENV", other.to_string())),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Production => "production",
            DeploymentMode::Secure => "secure",
        };
        f.write_str(name)
    }
}

/// Which document store backs the `DocumentDb` handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Firestore,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "firestore" => Ok(StorageBackend::Firestore),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::Invalid("STORAGE", other.to_string())),
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment mode (`APP_ENV`)
    pub mode: DeploymentMode,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Document store backend
    pub storage: StorageBackend,
    /// Directory served as static assets
    pub public_dir: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// Session signing secret (raw bytes)
    pub session_secret: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Development,
            frontend_url: "http://localhost:3000".to_string(),
            gcp_project_id: "test-project".to_string(),
            storage: StorageBackend::Memory,
            public_dir: "./public".to_string(),
            port: 3000,
            session_secret: b"test_session_secret_32_bytes!!!!".to_vec(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let mode = match env::var("APP_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => DeploymentMode::default(),
        };

        let storage = match env::var("STORAGE") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        let session_secret = env::var("SESSION_SECRET")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.is_empty() {
            return Err(ConfigError::Missing("SESSION_SECRET"));
        }

        Ok(Self {
            mode,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            storage,
            public_dir: env::var("PUBLIC_DIR").unwrap_or_else(|_| "./public".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", env::var("PORT").unwrap_or_default()))?,
            session_secret: session_secret.into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
