/// Configuration management for the Renovo backend
///
/// Handles server binding, database location, upload storage, identity provider
/// and background sweep parameters. Every value can be overridden through a
/// `RENOVO_*` environment variable for container deployments.

use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Uploaded file storage
    pub storage: StorageConfig,
    /// Session and identity provider settings
    pub auth: AuthConfig,
    /// Background overdue sweep
    pub scheduler: SchedulerConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Origin allowed to call the API from a browser (the frontend).
    /// `None` allows any origin.
    pub allowed_origin: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Base directory for the database file and uploads (default: "data")
    /// Creates: {data_dir}/renovo.db, {data_dir}/uploads/
    pub data_dir: String,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Maximum accepted request body for document and photo uploads
    pub upload_limit_bytes: usize,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// OIDC userinfo endpoint of the identity provider
    pub userinfo_url: String,
    /// Lifetime of a session issued after a successful login
    pub session_ttl_hours: i64,
}

/// Overdue sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cron expression with seconds field (tokio-cron-scheduler syntax)
    pub sweep_schedule: String,
    /// Disable to skip starting the background job (tests, one-off tools)
    pub enabled: bool,
}

impl Config {
    /// Path of the SQLite database file
    pub fn database_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.database.data_dir).join("renovo.db")
    }

    /// Root directory of the file store
    pub fn uploads_dir(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.database.data_dir).join("uploads")
    }

    /// Configuration rooted at an explicit data directory, everything else default.
    pub fn with_data_dir(data_dir: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.database.data_dir = data_dir.into();
        config
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for k8s/container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: env_or("RENOVO_HOST", "0.0.0.0"),
                port: env_parse("RENOVO_PORT", 3004),
                allowed_origin: std::env::var("RENOVO_ALLOWED_ORIGIN").ok(),
            },
            database: DatabaseConfig {
                data_dir: env_or("RENOVO_DATA_DIR", "data"),
            },
            storage: StorageConfig {
                upload_limit_bytes: env_parse("RENOVO_UPLOAD_LIMIT_BYTES", 25 * 1024 * 1024),
            },
            auth: AuthConfig {
                userinfo_url: env_or(
                    "RENOVO_USERINFO_URL",
                    "https://openidconnect.googleapis.com/v1/userinfo",
                ),
                session_ttl_hours: env_parse("RENOVO_SESSION_TTL_HOURS", 24 * 7),
            },
            scheduler: SchedulerConfig {
                sweep_schedule: env_or("RENOVO_SWEEP_SCHEDULE", "0 0 * * * *"),
                enabled: env_parse("RENOVO_SWEEP_ENABLED", true),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_data_dir() {
        let config = Config::with_data_dir("/tmp/renovo-test");
        assert_eq!(config.database_path(), std::path::Path::new("/tmp/renovo-test/renovo.db"));
        assert_eq!(config.uploads_dir(), std::path::Path::new("/tmp/renovo-test/uploads"));
    }

    #[test]
    fn unparsable_env_values_fall_back() {
        assert_eq!(env_parse::<u16>("RENOVO_TEST_UNSET_PORT_VALUE", 8080), 8080);
    }
}
