use serde::Deserialize;
use std::env;
use std::time::Duration;

use super::parse_env;
use crate::core::Result;

/// Resources served when RESOURCES is not set
pub const DEFAULT_RESOURCES: &str = "users,roles,categories,activity-logs,pages";

/// Record store access settings
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Upstream record store; `None` serves from memory
    pub base_url: Option<String>,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub default_page_size: u32,
    pub resources: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_ms: 30_000,
            max_retries: 3,
            default_page_size: 10,
            resources: split_resources(DEFAULT_RESOURCES),
        }
    }
}

impl RemoteConfig {
    pub fn from_env() -> Result<Self> {
        Ok(RemoteConfig {
            base_url: env::var("UPSTREAM_BASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            request_timeout_ms: parse_env("REQUEST_TIMEOUT_MS", "30000")?,
            max_retries: parse_env("REQUEST_MAX_RETRIES", "3")?,
            default_page_size: parse_env("DEFAULT_PAGE_SIZE", "10")?,
            resources: split_resources(
                &env::var("RESOURCES").unwrap_or_else(|_| DEFAULT_RESOURCES.to_string()),
            ),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn split_resources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
