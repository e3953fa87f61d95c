//! Purchases FX
//!
//! Historical exchange-rate lookup and currency conversion.
//!
//! # Features
//!
//! - Lookback search for the latest rate at or before a date
//! - Deterministic tie-breaking between same-day rates
//! - Fixed-point conversion with round-half-up
//! - Result caching with configurable TTL
//! - US Treasury "Rates of Exchange" source
//!
//! # Example
//!
//! ```rust,ignore
//! use purchases_fx::{ExchangeRateProvider, ProviderConfig, TreasuryRateSource, CurrencyConverter};
//!
//! let source = Arc::new(TreasuryRateSource::new(TreasuryConfig::default())?);
//! let provider = ExchangeRateProvider::new(source, ProviderConfig::default());
//!
//! let rate = provider.find_rate(&currency, record_date, 6).await?;
//! let converted = CurrencyConverter::default().convert(amount, rate.rate)?;
//! ```

pub mod provider;
pub mod source;
pub mod treasury;
pub mod cache;
pub mod conversion;
pub mod error;

pub use provider::{ExchangeRateProvider, ProviderConfig};
pub use source::RateSource;
#[cfg(any(test, feature = "test-utils"))]
pub use source::MockRateSource;
pub use treasury::{TreasuryConfig, TreasuryRateSource};
pub use cache::{RateCache, RateCacheConfig};
pub use conversion::CurrencyConverter;
pub use error::{FxError, FxResult};
