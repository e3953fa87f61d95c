//! Lookback search for historical exchange rates.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use purchases_common::{constants, Currency, ExchangeRate, LookbackWindow};
use tracing::{debug, info, instrument, warn};

use crate::cache::{RateCache, RateCacheConfig, RateQuery};
use crate::error::{FxError, FxResult};
use crate::source::RateSource;

/// Configuration for the exchange-rate provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
    /// Maximum time to wait for the rate source.
    pub source_timeout: Duration,
    /// Whether to cache successful lookups.
    pub use_cache: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cache: RateCacheConfig::default(),
            source_timeout: constants::rate_source_timeout(),
            use_cache: true,
        }
    }
}

/// Finds the most recent usable rate at or before a date.
pub struct ExchangeRateProvider {
    source: Arc<dyn RateSource>,
    cache: RateCache,
    config: ProviderConfig,
}

impl ExchangeRateProvider {
    /// Create a new provider over the given source.
    pub fn new(source: Arc<dyn RateSource>, config: ProviderConfig) -> Self {
        Self {
            source,
            cache: RateCache::with_config(config.cache.clone()),
            config,
        }
    }

    /// Find the rate for `currency` with the latest effective date in
    /// `[on_or_before - lookback_months, on_or_before]`.
    ///
    /// Same-day rates are ordered by lowest source line, then lowest rate.
    #[instrument(skip(self), fields(currency = %currency, source = self.source.name()))]
    pub async fn find_rate(
        &self,
        currency: &Currency,
        on_or_before: NaiveDate,
        lookback_months: u32,
    ) -> FxResult<ExchangeRate> {
        let query = RateQuery {
            currency: currency.clone(),
            on_or_before,
            lookback_months,
        };

        if self.config.use_cache {
            if let Some(cached) = self.cache.get(&query) {
                debug!("Using cached rate");
                return Ok(cached);
            }
        }

        let window = LookbackWindow::ending_at(on_or_before, lookback_months);

        let rates = tokio::time::timeout(
            self.config.source_timeout,
            self.source.rates_between(currency, window.start, window.end),
        )
        .await
        .map_err(|_| {
            warn!(timeout_ms = self.config.source_timeout.as_millis() as u64, "Rate source stalled");
            FxError::SourceTimeout(self.config.source_timeout.as_millis() as u64)
        })??;

        let rate = select_latest(rates, currency, &window).ok_or_else(|| {
            info!(window_start = %window.start, window_end = %window.end, "No rate in lookback window");
            FxError::RateUnavailable {
                currency: currency.clone(),
                on_or_before,
            }
        })?;

        debug!(
            rate = %rate.rate,
            effective_date = %rate.effective_date,
            "Resolved rate"
        );

        if self.config.use_cache {
            self.cache.insert(query, rate.clone());
        }

        Ok(rate)
    }

    /// Get the source name.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Drop expired cache entries.
    pub fn cleanup(&self) {
        self.cache.evict_expired();
    }
}

/// Pick the latest usable rate for `currency` inside `window`.
fn select_latest(
    rates: Vec<ExchangeRate>,
    currency: &Currency,
    window: &LookbackWindow,
) -> Option<ExchangeRate> {
    rates
        .into_iter()
        .filter(|rate| {
            let keep =
                rate.currency == *currency && window.contains(rate.effective_date) && rate.is_usable();
            if !keep {
                warn!(rate = %rate, "Discarding rate outside query");
            }
            keep
        })
        .max_by(|a, b| {
            a.effective_date
                .cmp(&b.effective_date)
                .then_with(|| b.source_line.cmp(&a.source_line))
                .then_with(|| b.rate.cmp(&a.rate))
        })
}
