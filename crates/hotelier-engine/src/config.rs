//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HOTELIER_DB_PATH=/var/lib/hotelier/hotelier.db                     │
//! │     HOTELIER_RATES_ENDPOINT=https://rates.example.com/latest           │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/hotelier/hotelier.toml (Linux)                           │
//! │     ~/Library/Application Support/com.hotelier.engine/hotelier.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "./hotelier.db"
//! max_connections = 5
//!
//! [rates]
//! endpoint = "https://open.er-api.com/v6/latest"
//! timeout_ms = 3000
//! fallback_rate = 320.0
//!
//! [notifications]
//! poll_interval_secs = 5
//! batch_size = 50
//! max_attempts = 5
//! webhook_url = "https://mail-relay.internal/confirmations"
//! webhook_timeout_ms = 5000
//! cleanup_after_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use hotelier_core::{ExchangeRate, FALLBACK_EXCHANGE_RATE};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./hotelier.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Rate Settings
// =============================================================================

/// Exchange-rate provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateSettings {
    /// Base URL; the provider is called as `GET {endpoint}/USD` and the
    /// LKR rate is read from the answer.
    #[serde(default = "default_rates_endpoint")]
    pub endpoint: String,

    /// Bound on the single provider call (milliseconds).
    #[serde(default = "default_rates_timeout")]
    pub timeout_ms: u64,

    /// Substituted whenever the provider cannot answer.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: f64,
}

fn default_rates_endpoint() -> String {
    "https://open.er-api.com/v6/latest".to_string()
}

fn default_rates_timeout() -> u64 {
    3000
}

fn default_fallback_rate() -> f64 {
    FALLBACK_EXCHANGE_RATE.as_f64()
}

impl Default for RateSettings {
    fn default() -> Self {
        RateSettings {
            endpoint: default_rates_endpoint(),
            timeout_ms: default_rates_timeout(),
            fallback_rate: default_fallback_rate(),
        }
    }
}

impl RateSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The configured fallback as an exact rate.
    pub fn fallback(&self) -> EngineResult<ExchangeRate> {
        ExchangeRate::from_f64(self.fallback_rate).ok_or_else(|| {
            EngineError::Config(format!(
                "fallback_rate must be a positive number, got {}",
                self.fallback_rate
            ))
        })
    }
}

// =============================================================================
// Notification Settings
// =============================================================================

/// Outbox dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Interval between outbox poll cycles (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Entries delivered per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Delivery attempts before an entry is left for manual follow-up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Mail relay endpoint. Confirmations are only logged when unset.
    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_webhook_timeout")]
    pub webhook_timeout_ms: u64,

    /// Delivered entries older than this are purged.
    #[serde(default = "default_cleanup_after_days")]
    pub cleanup_after_days: u32,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_batch_size() -> u32 {
    50
}

fn default_max_attempts() -> u32 {
    5
}

fn default_webhook_timeout() -> u64 {
    5000
}

fn default_cleanup_after_days() -> u32 {
    30
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            webhook_url: None,
            webhook_timeout_ms: default_webhook_timeout(),
            cleanup_after_days: default_cleanup_after_days(),
        }
    }
}

impl NotificationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub rates: RateSettings,

    #[serde(default)]
    pub notifications: NotificationSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (hotelier.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document; missing sections take their defaults.
    pub fn from_toml(contents: &str) -> EngineResult<Self> {
        toml::from_str(contents).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.database.max_connections == 0 {
            return Err(EngineError::Config(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        let endpoint = &self.rates.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(EngineError::Config(format!(
                "rates.endpoint must start with http:// or https://, got: {}",
                endpoint
            )));
        }

        if self.rates.timeout_ms == 0 {
            return Err(EngineError::Config("rates.timeout_ms must be greater than 0".into()));
        }

        self.rates.fallback()?;

        if let Some(ref url) = self.notifications.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(EngineError::Config(format!(
                    "notifications.webhook_url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if self.notifications.batch_size == 0 {
            return Err(EngineError::Config(
                "notifications.batch_size must be greater than 0".into(),
            ));
        }

        if self.notifications.max_attempts == 0 {
            return Err(EngineError::Config(
                "notifications.max_attempts must be greater than 0".into(),
            ));
        }

        if self.notifications.poll_interval_secs == 0 {
            return Err(EngineError::Config(
                "notifications.poll_interval_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("HOTELIER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(max) = std::env::var("HOTELIER_DB_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid HOTELIER_DB_MAX_CONNECTIONS"),
            }
        }

        if let Ok(endpoint) = std::env::var("HOTELIER_RATES_ENDPOINT") {
            debug!(endpoint = %endpoint, "Overriding rates endpoint from environment");
            self.rates.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("HOTELIER_RATES_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => self.rates.timeout_ms = ms,
                Err(_) => warn!(value = %timeout, "Ignoring invalid HOTELIER_RATES_TIMEOUT_MS"),
            }
        }

        if let Ok(rate) = std::env::var("HOTELIER_FALLBACK_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => self.rates.fallback_rate = r,
                Err(_) => warn!(value = %rate, "Ignoring invalid HOTELIER_FALLBACK_RATE"),
            }
        }

        if let Ok(url) = std::env::var("HOTELIER_WEBHOOK_URL") {
            debug!(url = %url, "Overriding webhook URL from environment");
            self.notifications.webhook_url = Some(url).filter(|u| !u.is_empty());
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "hotelier", "engine")
            .map(|dirs| dirs.config_dir().join("hotelier.toml"))
    }
}
