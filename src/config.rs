use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_STATE_FILE: &str = ".rental-scout/session.json";
const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Client configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the marketplace REST API
    pub api_base_url: String,
    /// Where the signed-in session is persisted between runs
    pub state_file: PathBuf,
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url =
            lookup("RENTAL_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!(
                "RENTAL_API_BASE_URL must start with http:// or https://, got '{}'",
                api_base_url
            );
        }

        Ok(Self {
            api_base_url,
            state_file: lookup("RENTAL_STATE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            http_timeout: Duration::from_secs(
                lookup("RENTAL_HTTP_TIMEOUT_SECS")
                    .unwrap_or_else(|| DEFAULT_TIMEOUT_SECS.to_string())
                    .trim()
                    .parse()
                    .context("RENTAL_HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
        })
    }
}
