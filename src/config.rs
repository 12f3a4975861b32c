use std::env;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub db_path: String,
    /// Base URL of the content-source API.
    pub api_url: String,
    /// Bearer token for the content-source API.
    pub api_token: String,
    /// Trending-score threshold — items strictly above it are flagged.
    pub trending_threshold: f64,
    /// Max posts fetched per account per collection run.
    pub max_posts_per_account: u32,
    /// Default sliding window for trend analysis, in hours.
    pub collection_window_hours: i64,
    /// Default lookback for account analytics rollups, in days.
    pub analytics_lookback_days: i64,
}

/// Default content-source API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.x.com/2";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the API token has no default — `init`, `analyze`, and `status`
    /// work without it; collection requires it.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("WILDFIRE_DB_PATH").unwrap_or_else(|_| "./wildfire.db".to_string()),
            api_url: env::var("WILDFIRE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_token: env::var("WILDFIRE_API_TOKEN").unwrap_or_default(),
            trending_threshold: parse_env("TRENDING_THRESHOLD", 50.0),
            max_posts_per_account: parse_env("MAX_POSTS_PER_ACCOUNT", 100),
            collection_window_hours: parse_env("COLLECTION_WINDOW_HOURS", 24),
            analytics_lookback_days: parse_env("ANALYTICS_LOOKBACK_DAYS", 30),
        })
    }

    /// Check that the content-source API token is configured.
    /// Call this before any operation that hits the upstream API.
    pub fn require_source(&self) -> Result<()> {
        if self.api_token.is_empty() {
            anyhow::bail!(
                "WILDFIRE_API_TOKEN not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_on_missing() {
        assert_eq!(parse_env("WILDFIRE_TEST_MISSING_KEY", 42u32), 42);
    }

    #[test]
    fn require_source_rejects_empty_token() {
        let config = Config {
            db_path: String::new(),
            api_url: String::new(),
            api_token: String::new(),
            trending_threshold: 50.0,
            max_posts_per_account: 100,
            collection_window_hours: 24,
            analytics_lookback_days: 30,
        };
        assert!(config.require_source().is_err());
    }
}
