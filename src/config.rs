//! Application configuration.
//!
//! Values come from `config/default.yaml` (or the file named by `APP_CONFIG`),
//! overridden by `APP__`-prefixed environment variables such as
//! `APP__JWT__SECRET` or `APP__DATABASE__HOST`.

use serde::Deserialize;
use std::env;

const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Longest accepted token lifetime, ten years
pub const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Longest accepted cookie `Max-Age`, ten years
pub const MAX_COOKIE_AGE_HOURS: i64 = 10 * 365 * 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub cookie: CookieSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    /// Token lifetime in seconds
    pub expiration_secs: i64,
}

impl JwtSettings {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds(self.expiration_secs).unwrap_or_else(chrono::Duration::zero)
    }
}

/// Session cookie attributes; the cookie lifetime is separate from the token ttl
#[derive(Debug, Deserialize, Clone)]
pub struct CookieSettings {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: i64,
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
            secure: default_secure(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_age_hours() -> i64 {
    24
}

fn default_secure() -> bool {
    true
}

impl AppConfig {
    /// Loads and validates configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let settings = config::Config::builder()
            .add_source(config::File::with_name(&path))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Invalid("jwt.secret must not be empty".to_string()));
        }
        if !(0..=MAX_TOKEN_TTL_SECS).contains(&self.jwt.expiration_secs) {
            return Err(ConfigError::Invalid(format!(
                "jwt.expiration_secs must be between 0 and {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if !(0..=MAX_COOKIE_AGE_HOURS).contains(&self.cookie.max_age_hours) {
            return Err(ConfigError::Invalid(format!(
                "cookie.max_age_hours must be between 0 and {}",
                MAX_COOKIE_AGE_HOURS
            )));
        }
        Ok(())
    }
}
