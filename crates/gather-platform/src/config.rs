//! Application Configuration
//!
//! All runtime configuration is loaded once from the environment at
//! process start and passed explicitly to the components that need it.
//! Nothing reads ambient globals after startup.

use std::path::PathBuf;

use crate::error::{GatherError, Result};

/// Runtime configuration for the platform server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP API port.
    pub api_port: u16,
    /// MongoDB connection URL.
    pub mongo_url: String,
    /// MongoDB database name.
    pub mongo_db: String,
    /// HS256 signing secret for access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds.
    pub token_expiry_secs: i64,
    /// Root of the public directory holding `uploads/` and `profiles/`.
    pub public_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from `GATHER_*` environment variables.
    ///
    /// `GATHER_JWT_SECRET` is required; everything else has a
    /// development-friendly default.
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("GATHER_JWT_SECRET").map_err(|_| GatherError::Configuration {
            message: "GATHER_JWT_SECRET must be set".to_string(),
        })?;
        if jwt_secret.trim().is_empty() {
            return Err(GatherError::Configuration {
                message: "GATHER_JWT_SECRET must not be empty".to_string(),
            });
        }

        Ok(Self {
            api_port: env_or_parse("GATHER_API_PORT", 5000),
            mongo_url: env_or("GATHER_MONGO_URL", "mongodb://localhost:27017"),
            mongo_db: env_or("GATHER_MONGO_DB", "eventmanager"),
            jwt_secret,
            token_expiry_secs: env_or_parse("GATHER_TOKEN_EXPIRY_SECS", 86400 * 7),
            public_dir: PathBuf::from(env_or("GATHER_PUBLIC_DIR", "public")),
        })
    }

    /// Directory for event images, served under `/uploads`.
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join("uploads")
    }

    /// Directory for profile images, served under `/profiles`.
    pub fn profiles_dir(&self) -> PathBuf {
        self.public_dir.join("profiles")
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
