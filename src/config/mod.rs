use crate::core::{AppError, Result};
use serde::Deserialize;
use std::env;

pub mod grid;
pub mod remote;
pub mod server;

pub use grid::GridConfig;
pub use remote::RemoteConfig;
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub grid: GridConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Read an env var, falling back to `default`, and parse it
pub(crate) fn parse_env<T: std::str::FromStr>(name: &str, default: &str) -> Result<T> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Configuration(format!("Invalid {}", name)))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: parse_env("LOG_FORMAT", "pretty")?,
            },
            server: ServerConfig::from_env()?,
            remote: RemoteConfig::from_env()?,
            grid: GridConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.remote.default_page_size == 0 {
            return Err(AppError::Configuration(
                "Default page size must be greater than 0".to_string(),
            ));
        }

        if self.remote.request_timeout_ms == 0 {
            return Err(AppError::Configuration(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.remote.resources.is_empty() {
            return Err(AppError::Configuration(
                "At least one resource must be configured".to_string(),
            ));
        }

        self.grid.validate()
    }
}
