//! Application configuration management.

use chrono::TimeDelta;
use serde::Deserialize;
use std::path::PathBuf;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_SECS: u64 = 365 * 86400;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Where entity collections are persisted.
    #[serde(default)]
    pub storage: StorageProvider,
    /// Session configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// First-run administrator account.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend for the JSON entity collections.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// One JSON file per collection under `root`.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory; data is lost on exit.
    Memory,
    /// S3-compatible bucket: Cloudflare R2, Supabase, AWS S3.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
}

impl Default for StorageProvider {
    fn default() -> Self {
        Self::LocalFs {
            root: PathBuf::from("./data"),
        }
    }
}

impl StorageProvider {
    /// Short provider name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local_fs",
            Self::Memory => "memory",
            Self::S3 { .. } => "s3",
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl(),
        }
    }
}

impl SessionConfig {
    /// Session lifetime, or `None` when `ttl_secs` is zero or above
    /// [`MAX_SESSION_TTL_SECS`].
    #[must_use]
    pub fn ttl(&self) -> Option<TimeDelta> {
        if self.ttl_secs == 0 || self.ttl_secs > MAX_SESSION_TTL_SECS {
            return None;
        }
        i64::try_from(self.ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
    }
}

fn default_session_ttl() -> u64 {
    86400 // 24 hours
}

/// Administrator created when the user collection is empty.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Admin username.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Admin email.
    #[serde(default = "default_admin_email")]
    pub admin_email: String,
    /// Admin password. No admin is created without one.
    pub admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_email: default_admin_email(),
            admin_password: None,
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or the session
    /// lifetime is out of range.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TIMEBILL").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        if config.session.ttl().is_none() {
            return Err(config::ConfigError::Message(format!(
                "session.ttl_secs must be between 1 and {MAX_SESSION_TTL_SECS}, got {}",
                config.session.ttl_secs
            )));
        }
        Ok(config)
    }
}
