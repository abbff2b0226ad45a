use std::env;
use std::path::PathBuf;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub cookies: CookieConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Signing secrets and lifetimes of the two session tokens.
#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_expiration_minutes: i64,
    pub refresh_secret: String,
    pub refresh_expiration_days: i64,
}

impl JwtConfig {
    /// # Errors
    /// * `ConfigError::Message` - Lifetime does not fit a `chrono::Duration`
    pub fn access_lifetime(&self) -> Result<Duration, ConfigError> {
        Duration::try_minutes(self.access_expiration_minutes).ok_or_else(|| {
            ConfigError::Message(format!(
                "jwt.access_expiration_minutes out of range: {}",
                self.access_expiration_minutes
            ))
        })
    }

    /// # Errors
    /// * `ConfigError::Message` - Lifetime does not fit a `chrono::Duration`
    pub fn refresh_lifetime(&self) -> Result<Duration, ConfigError> {
        Duration::try_days(self.refresh_expiration_days).ok_or_else(|| {
            ConfigError::Message(format!(
                "jwt.refresh_expiration_days out of range: {}",
                self.refresh_expiration_days
            ))
        })
    }
}

/// Attributes applied to the `accessToken` and `refreshToken` cookies.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CookieConfig {
    pub http_only: bool,
    pub secure: bool,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            http_only: true,
            secure: true,
            path: "/".to_string(),
        }
    }
}

/// Where uploaded avatars and cover images are written and how they are addressed.
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    pub directory: PathBuf,
    pub public_base_url: String,
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__ACCESS_SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__REFRESH_SECRET=... overrides jwt.refresh_secret
            .add_source(Environment::default().separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
