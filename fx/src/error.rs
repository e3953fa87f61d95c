//! FX error types.

use chrono::NaiveDate;
use purchases_common::{Currency, PurchasesError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while looking up or applying exchange rates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FxError {
    /// No usable rate exists inside the lookback window.
    #[error("Rate not available for {currency} on or before {on_or_before}")]
    RateUnavailable {
        currency: Currency,
        on_or_before: NaiveDate,
    },

    /// The rate source could not be reached or answered with a failure.
    #[error("Rate source unavailable: {0}")]
    SourceUnavailable(String),

    /// The rate source did not answer in time.
    #[error("Rate source timed out after {0}ms")]
    SourceTimeout(u64),

    /// The rate source answered with data that could not be parsed.
    #[error("Malformed rate data: {0}")]
    MalformedRate(String),

    /// The converted amount does not fit the decimal range.
    #[error("Converting {amount} at {rate} overflows")]
    ConversionOverflow { amount: Decimal, rate: Decimal },
}

impl FxError {
    /// Check if the failure comes from the rate source rather than the data.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            FxError::SourceUnavailable(_) | FxError::SourceTimeout(_) | FxError::MalformedRate(_)
        )
    }
}

impl From<FxError> for PurchasesError {
    fn from(err: FxError) -> Self {
        match err {
            FxError::RateUnavailable {
                currency,
                on_or_before,
            } => PurchasesError::ConversionUnavailable {
                currency,
                on_or_before,
            },
            FxError::ConversionOverflow { amount, rate } => {
                PurchasesError::ConversionOverflow { amount, rate }
            }
            source @ (FxError::SourceUnavailable(_)
            | FxError::SourceTimeout(_)
            | FxError::MalformedRate(_)) => PurchasesError::SourceUnavailable(source.to_string()),
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
