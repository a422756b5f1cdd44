use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Timing of the synchronisation loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Pause between two periodic synchronisation cycles.
    pub sync_interval: Duration,
    /// First delay before retrying a failed token list fetch.
    pub retry_interval: Duration,
    /// Upper bound of the retry delay.
    pub max_retry_interval: Duration,
    /// Factor applied to the retry delay after each failure.
    pub retry_backoff: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(60),
            retry_interval: Duration::from_millis(500),
            max_retry_interval: Duration::from_secs(60),
            retry_backoff: 2.0,
        }
    }
}

impl SyncConfig {
    /// Delay before the retry following `failures` consecutive failures.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1).min(32) as i32;
        let factor = self.retry_backoff.max(1.0).powi(exponent);
        let delay = self.retry_interval.as_secs_f64() * factor;
        Duration::from_secs_f64(delay.min(self.max_retry_interval.as_secs_f64()))
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string; in-memory storage when absent.
    pub database_url: Option<String>,

    /// Relay endpoint serving the token list.
    pub token_list_url: String,

    /// Interval between checks of pending transactions.
    pub pending_poll_interval: Duration,

    pub sync: SyncConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            token_list_url: "https://safe-relay.gnosis.io/api/v1/tokens/?limit=3000".to_string(),
            pending_poll_interval: Duration::from_secs(15),
            sync: SyncConfig::default(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            token_list_url: env::var("TOKEN_LIST_URL").unwrap_or(defaults.token_list_url),
            pending_poll_interval: Duration::from_secs(parse_var(
                "PENDING_POLL_INTERVAL_SECS",
                defaults.pending_poll_interval.as_secs(),
            )),
            sync: SyncConfig {
                sync_interval: Duration::from_secs(parse_var(
                    "SYNC_INTERVAL_SECS",
                    defaults.sync.sync_interval.as_secs(),
                )),
                retry_interval: Duration::from_millis(parse_var(
                    "SYNC_RETRY_INTERVAL_MS",
                    defaults.sync.retry_interval.as_millis() as u64,
                )),
                max_retry_interval: Duration::from_millis(parse_var(
                    "SYNC_MAX_RETRY_INTERVAL_MS",
                    defaults.sync.max_retry_interval.as_millis() as u64,
                )),
                retry_backoff: parse_var("SYNC_RETRY_BACKOFF", defaults.sync.retry_backoff),
            },
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid value of {}: {}", name, value);
            default
        }),
        Err(_) => default,
    }
}
