//! Exchange-rate source trait and test double.

use async_trait::async_trait;
use chrono::NaiveDate;
use purchases_common::{Currency, ExchangeRate};

use crate::error::FxResult;

/// A read-only source of historical exchange rates.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Get the rates for `currency` whose effective date lies in `[from, to]`.
    ///
    /// An empty vector means the source has no data for the range; failures
    /// to reach the source are reported as errors.
    async fn rates_between(
        &self,
        currency: &Currency,
        from: NaiveDate,
        to: NaiveDate,
    ) -> FxResult<Vec<ExchangeRate>>;
}

/// In-memory rate source for testing.
///
/// Returns every rate stored for a currency regardless of the requested
/// range, so window filtering is left to the caller.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateSource {
    name: String,
    rates: dashmap::DashMap<Currency, Vec<ExchangeRate>>,
    available: std::sync::atomic::AtomicBool,
    delay_ms: std::sync::atomic::AtomicU64,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateSource {
    /// Create a new mock source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: dashmap::DashMap::new(),
            available: std::sync::atomic::AtomicBool::new(true),
            delay_ms: std::sync::atomic::AtomicU64::new(0),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Add a rate.
    pub fn add_rate(&self, rate: ExchangeRate) {
        self.rates.entry(rate.currency.clone()).or_default().push(rate);
    }

    /// Simulate an outage.
    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    /// Delay every answer.
    pub fn set_delay(&self, delay: std::time::Duration) {
        self.delay_ms.store(
            delay.as_millis() as u64,
            std::sync::atomic::Ordering::SeqCst,
        );
    }

    /// Number of queries served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateSource for MockRateSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rates_between(
        &self,
        currency: &Currency,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> FxResult<Vec<ExchangeRate>> {
        use std::sync::atomic::Ordering;

        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }

        if !self.available.load(Ordering::SeqCst) {
            return Err(crate::error::FxError::SourceUnavailable(format!(
                "{} is down",
                self.name
            )));
        }

        Ok(self
            .rates
            .get(currency)
            .map(|r| r.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_mock_source_returns_rates_for_currency() {
        let source = MockRateSource::new("test");
        let euro = Currency::new("Euro Zone-Euro");
        source.add_rate(ExchangeRate::new(euro.clone(), dec!(0.82), date(2020, 12, 31)));
        source.add_rate(ExchangeRate::new(Currency::new("Canada-Dollar"), dec!(1.27), date(2020, 12, 31)));

        let rates = source
            .rates_between(&euro, date(2020, 7, 1), date(2021, 1, 1))
            .await
            .unwrap();

        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].rate, dec!(0.82));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_source_outage() {
        let source = MockRateSource::new("test");
        source.set_available(false);

        let result = source
            .rates_between(&Currency::new("Euro Zone-Euro"), date(2020, 7, 1), date(2021, 1, 1))
            .await;

        assert!(matches!(result, Err(FxError::SourceUnavailable(_))));
    }
}
