//! Monetary types for the purchases service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PurchasesError;

/// Maximum length of a currency identifier.
pub const MAX_CURRENCY_LEN: usize = 64;

/// Target currency of a conversion.
///
/// Identifiers follow the exchange-rate source's naming, which for the
/// Treasury reporting rates is the country-currency descriptor
/// (`"Euro Zone-Euro"`, `"Canada-Dollar"`). Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Create a new currency without validation.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    /// Parse a caller-supplied currency identifier.
    pub fn parse(code: &str) -> Result<Self, PurchasesError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(PurchasesError::validation("Currency must not be blank", "currency"));
        }

        if code.chars().count() > MAX_CURRENCY_LEN {
            return Err(PurchasesError::validation(
                format!("Currency must be at most {} characters", MAX_CURRENCY_LEN),
                "currency",
            ));
        }

        if code.chars().any(char::is_control) {
            return Err(PurchasesError::validation(
                "Currency contains control characters",
                "currency",
            ));
        }

        Ok(Self(code.to_string()))
    }

    /// Get the currency identifier.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Historical exchange rate from the native currency into `currency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Target currency.
    pub currency: Currency,
    /// Units of `currency` per unit of the native currency.
    pub rate: Decimal,
    /// Date from which the rate applies.
    pub effective_date: NaiveDate,
    /// Date the rate was published by the source.
    pub record_date: NaiveDate,
    /// Source-assigned line number, used to order same-day rates.
    pub source_line: u64,
}

impl ExchangeRate {
    /// Create a new exchange rate published on its effective date.
    pub fn new(currency: Currency, rate: Decimal, effective_date: NaiveDate) -> Self {
        Self {
            currency,
            rate,
            effective_date,
            record_date: effective_date,
            source_line: 0,
        }
    }

    /// Set the publication date.
    pub fn with_record_date(mut self, record_date: NaiveDate) -> Self {
        self.record_date = record_date;
        self
    }

    /// Set the source line number.
    pub fn with_source_line(mut self, source_line: u64) -> Self {
        self.source_line = source_line;
        self
    }

    /// Check that the rate can be applied to an amount.
    pub fn is_usable(&self) -> bool {
        self.rate > Decimal::ZERO
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.rate, self.currency, self.effective_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_parse_trims() {
        let currency = Currency::parse("  Euro Zone-Euro ").unwrap();
        assert_eq!(currency.code(), "Euro Zone-Euro");
    }

    #[test]
    fn test_currency_parse_rejects_blank() {
        let err = Currency::parse("   ").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_currency_parse_rejects_long_codes() {
        let code = "X".repeat(MAX_CURRENCY_LEN + 1);
        assert!(Currency::parse(&code).is_err());
        assert!(Currency::parse(&"X".repeat(MAX_CURRENCY_LEN)).is_ok());
    }

    #[test]
    fn test_currency_parse_rejects_control_characters() {
        assert!(Currency::parse("Euro\u{0}").is_err());
    }

    #[test]
    fn test_exchange_rate_usable() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert!(ExchangeRate::new(Currency::new("Euro Zone-Euro"), dec!(0.82), date).is_usable());
        assert!(!ExchangeRate::new(Currency::new("Euro Zone-Euro"), dec!(0), date).is_usable());
    }

    #[test]
    fn test_exchange_rate_builders() {
        let effective = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
        let published = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let rate = ExchangeRate::new(Currency::new("Canada-Dollar"), dec!(1.27), effective)
            .with_record_date(published)
            .with_source_line(18);

        assert_eq!(rate.record_date, published);
        assert_eq!(rate.source_line, 18);
        assert_eq!(rate.to_string(), "1.27 Canada-Dollar @ 2020-12-31");
    }
}
