//! Application configuration. API credentials, limits, paths.

use serde::Deserialize;

/// Largest batch accepted by `/bulk`. Bigger inputs are rejected wholesale.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;
/// Outbound shortening calls allowed in flight at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
/// Entries kept in each user's recent list.
pub const DEFAULT_RECENT_CAPACITY: usize = 20;
pub const DEFAULT_CUTTLY_API_URL: &str = "https://cutt.ly/api/api.php";
pub const DEFAULT_QR_API_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Bot token from @BotFather. Read from TELEGRAM_BOT_TOKEN or TG_SHORTENER_TELEGRAM_BOT_TOKEN.
    #[serde(default)]
    pub telegram_bot_token: Option<String>,

    /// Cuttly API key. Read from CUTTLY_API_KEY or TG_SHORTENER_CUTTLY_API_KEY.
    #[serde(default)]
    pub cuttly_api_key: Option<String>,

    /// Cuttly endpoint. Defaults to the public API.
    #[serde(default)]
    pub cuttly_api_url: Option<String>,

    /// Timeout for one shortening call, seconds.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub max_concurrency: Option<usize>,

    #[serde(default)]
    pub max_batch_size: Option<usize>,

    /// Pause before the single retry of a transient failure, milliseconds.
    #[serde(default)]
    pub retry_backoff_ms: Option<u64>,

    #[serde(default)]
    pub recent_capacity: Option<usize>,

    /// JSON file for usage stats. In-memory store when unset.
    #[serde(default)]
    pub stats_path: Option<String>,

    #[serde(default)]
    pub qr_api_url: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("TG_SHORTENER"));
        if let Ok(path) = std::env::var("TG_SHORTENER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let mut cfg: Self = c.build()?.try_deserialize()?;
        // Unprefixed names kept so an existing .env with TELEGRAM_BOT_TOKEN / CUTTLY_API_KEY works as is
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            if !token.trim().is_empty() {
                cfg.telegram_bot_token = Some(token);
            }
        }
        if let Ok(key) = std::env::var("CUTTLY_API_KEY") {
            if !key.trim().is_empty() {
                cfg.cuttly_api_key = Some(key);
            }
        }
        Ok(cfg)
    }

    /// Returns the bot token if set and non-empty.
    pub fn telegram_bot_token(&self) -> Option<String> {
        self.telegram_bot_token
            .clone()
            .filter(|t| !t.trim().is_empty())
    }

    /// Returns the Cuttly key if set and non-empty.
    pub fn cuttly_api_key(&self) -> Option<String> {
        self.cuttly_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    /// Returns true if real shortening is configured (API key present).
    pub fn is_cuttly_configured(&self) -> bool {
        self.cuttly_api_key().is_some()
    }

    pub fn cuttly_api_url_or_default(&self) -> String {
        self.cuttly_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_CUTTLY_API_URL.to_string())
    }

    pub fn request_timeout_secs_or_default(&self) -> u64 {
        self.request_timeout_secs
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    /// Zero would deadlock the admission gate, so it falls back to the default.
    pub fn max_concurrency_or_default(&self) -> usize {
        self.max_concurrency
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn max_batch_size_or_default(&self) -> usize {
        self.max_batch_size
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_BATCH_SIZE)
    }

    pub fn retry_backoff_ms_or_default(&self) -> u64 {
        self.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
    }

    pub fn recent_capacity_or_default(&self) -> usize {
        self.recent_capacity.unwrap_or(DEFAULT_RECENT_CAPACITY)
    }

    pub fn qr_api_url_or_default(&self) -> String {
        self.qr_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_QR_API_URL.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.max_batch_size_or_default(), 50);
        assert_eq!(cfg.max_concurrency_or_default(), 5);
        assert_eq!(cfg.request_timeout_secs_or_default(), 10);
        assert_eq!(cfg.retry_backoff_ms_or_default(), 500);
        assert_eq!(cfg.recent_capacity_or_default(), 20);
        assert_eq!(cfg.cuttly_api_url_or_default(), DEFAULT_CUTTLY_API_URL);
        assert!(!cfg.is_cuttly_configured());
    }

    #[test]
    fn test_zero_limits_fall_back() {
        let cfg = AppConfig {
            max_concurrency: Some(0),
            max_batch_size: Some(0),
            request_timeout_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.max_concurrency_or_default(), DEFAULT_MAX_CONCURRENCY);
        assert_eq!(cfg.max_batch_size_or_default(), DEFAULT_MAX_BATCH_SIZE);
        assert_eq!(cfg.request_timeout_secs_or_default(), DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn test_blank_credentials_count_as_missing() {
        let cfg = AppConfig {
            telegram_bot_token: Some("  ".into()),
            cuttly_api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(cfg.telegram_bot_token().is_none());
        assert!(!cfg.is_cuttly_configured());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        // Only test in the crate that touches this variable.
        unsafe { std::env::set_var("TG_SHORTENER_CONFIG", &missing) };
        let loaded = AppConfig::load();
        unsafe { std::env::remove_var("TG_SHORTENER_CONFIG") };
        assert!(loaded.is_err());
    }
}
