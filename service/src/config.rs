//! Service configuration.

use std::str::FromStr;
use std::time::Duration;

use purchases_common::constants;
use purchases_fx::{ProviderConfig, RateCacheConfig, TreasuryConfig};

use crate::rate_limiter::RateLimiterConfig;
use crate::transaction_service::TransactionServiceConfig;

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// PostgreSQL URL. The in-memory store is used when unset.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Maximum time to wait on any store call.
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            timeout: constants::store_timeout(),
        }
    }
}

/// Exchange-rate lookup configuration.
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// Treasury Fiscal Data API base URL.
    pub treasury_base_url: String,
    /// Maximum time to wait on the rate source.
    pub source_timeout: Duration,
    /// How long successful lookups stay cached.
    pub cache_ttl: Duration,
    /// Months searched back from the purchase date.
    pub lookback_months: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            treasury_base_url: purchases_fx::treasury::DEFAULT_BASE_URL.to_string(),
            source_timeout: constants::rate_source_timeout(),
            cache_ttl: Duration::from_secs(3600),
            lookback_months: constants::DEFAULT_LOOKBACK_MONTHS,
        }
    }
}

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Persistence configuration.
    pub store: StoreConfig,
    /// Exchange-rate configuration.
    pub rates: RateConfig,
    /// Admission control configuration.
    pub rate_limiter: RateLimiterConfig,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            store: StoreConfig::default(),
            rates: RateConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, falling back to defaults for
    /// missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("PURCHASES_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = parsed(&lookup, "PURCHASES_LISTEN_PORT") {
            config.listen_port = port;
        }

        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            config.store.database_url = Some(url);
        }

        if let Some(max) = parsed(&lookup, "DATABASE_MAX_CONNECTIONS") {
            config.store.max_connections = max;
        }

        if let Some(ms) = parsed(&lookup, "STORE_TIMEOUT_MS") {
            config.store.timeout = Duration::from_millis(ms);
        }

        if let Some(url) = lookup("TREASURY_API_URL") {
            config.rates.treasury_base_url = url;
        }

        if let Some(ms) = parsed(&lookup, "RATE_SOURCE_TIMEOUT_MS") {
            config.rates.source_timeout = Duration::from_millis(ms);
        }

        if let Some(secs) = parsed(&lookup, "RATE_CACHE_TTL_SECS") {
            config.rates.cache_ttl = Duration::from_secs(secs);
        }

        if let Some(months) = parsed(&lookup, "LOOKBACK_MONTHS") {
            config.rates.lookback_months = months;
        }

        if let Some(limit) = parsed(&lookup, "RATE_LIMIT_PER_PERIOD") {
            config.rate_limiter.limit_for_period = limit;
        }

        if let Some(ms) = parsed(&lookup, "RATE_LIMIT_REFRESH_MS") {
            config.rate_limiter.refresh_period = Duration::from_millis(ms);
        }

        if let Some(ms) = parsed(&lookup, "RATE_LIMIT_TIMEOUT_MS") {
            config.rate_limiter.timeout = Duration::from_millis(ms);
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.store.max_connections == 0 {
            return Err("Database max connections cannot be 0".to_string());
        }

        if self.store.timeout.is_zero() {
            return Err("Store timeout cannot be 0".to_string());
        }

        if self.rates.treasury_base_url.is_empty() {
            return Err("Treasury API URL cannot be empty".to_string());
        }

        if self.rates.source_timeout.is_zero() {
            return Err("Rate source timeout cannot be 0".to_string());
        }

        if self.rates.lookback_months == 0 {
            return Err("Lookback months cannot be 0".to_string());
        }

        self.rate_limiter.validate()
    }

    /// Exchange-rate provider settings.
    pub fn provider_config(&self) -> ProviderConfig {
        let ttl = chrono::Duration::from_std(self.rates.cache_ttl)
            .unwrap_or_else(|_| chrono::Duration::hours(1));

        ProviderConfig {
            cache: RateCacheConfig {
                default_ttl: ttl,
                ..Default::default()
            },
            source_timeout: self.rates.source_timeout,
            use_cache: !self.rates.cache_ttl.is_zero(),
        }
    }

    /// Treasury client settings.
    pub fn treasury_config(&self) -> TreasuryConfig {
        TreasuryConfig {
            base_url: self.rates.treasury_base_url.clone(),
            timeout: self.rates.source_timeout,
            ..Default::default()
        }
    }

    /// Transaction service settings.
    pub fn service_config(&self) -> TransactionServiceConfig {
        TransactionServiceConfig {
            lookback_months: self.rates.lookback_months,
            store_timeout: self.store.timeout,
        }
    }
}

fn parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|value| value.trim().parse().ok())
}
