//! Rate lookup caching with TTL support.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use purchases_common::{Currency, ExchangeRate};
use tracing::debug;

/// Cache key: one resolved lookback query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateQuery {
    pub currency: Currency,
    pub on_or_before: NaiveDate,
    pub lookback_months: u32,
}

/// Cached lookup result.
#[derive(Debug, Clone)]
struct CacheEntry {
    rate: ExchangeRate,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(rate: ExchangeRate, ttl: Duration) -> Self {
        Self {
            rate,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// TTL for cached lookups.
    pub default_ttl: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            // Historical rates do not change once published.
            default_ttl: Duration::hours(1),
            max_entries: 10000,
        }
    }
}

/// Thread-safe cache of successful rate lookups.
pub struct RateCache {
    cache: DashMap<RateQuery, CacheEntry>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a cached lookup if still valid.
    pub fn get(&self, query: &RateQuery) -> Option<ExchangeRate> {
        if let Some(entry) = self.cache.get(query) {
            if entry.is_valid() {
                debug!(currency = %query.currency, on_or_before = %query.on_or_before, "Cache hit");
                return Some(entry.rate.clone());
            }

            debug!(currency = %query.currency, on_or_before = %query.on_or_before, "Cache entry expired");
            drop(entry);
            self.cache.remove(query);
        }

        None
    }

    /// Cache a lookup result.
    pub fn insert(&self, query: RateQuery, rate: ExchangeRate) {
        if self.cache.len() >= self.config.max_entries {
            self.evict_expired();
        }

        // Still full of live entries: skip rather than grow unbounded.
        if self.cache.len() >= self.config.max_entries {
            debug!(entries = self.cache.len(), "Rate cache full");
            return;
        }

        self.cache
            .insert(query, CacheEntry::new(rate, self.config.default_ttl));
    }

    /// Clear all cached lookups.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        self.cache.retain(|_, entry| entry.is_valid());
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}
