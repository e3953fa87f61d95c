//! Error taxonomy for the purchases service.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::Currency;

/// Main error type for purchases operations.
///
/// Entity absence is not an error: lookups return `Ok(None)` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PurchasesError {
    /// Malformed input rejected before reaching core logic.
    #[error("Invalid input: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The transaction exists but no exchange rate was found in the lookback window.
    #[error("No exchange rate for {currency} within the lookback window ending {on_or_before}")]
    ConversionUnavailable {
        currency: Currency,
        on_or_before: NaiveDate,
    },

    /// The converted amount does not fit the decimal range.
    #[error("Converting {amount} at rate {rate} exceeds the representable range")]
    ConversionOverflow { amount: Decimal, rate: Decimal },

    /// Transaction store unreachable, stalled or rejecting the operation.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Exchange-rate source unreachable or stalled.
    #[error("Exchange rate source unavailable: {0}")]
    SourceUnavailable(String),

    /// Admission rejected by the rate limiter.
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
}

impl PurchasesError {
    /// Create a validation error for a field.
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        PurchasesError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PurchasesError::Persistence(_)
                | PurchasesError::SourceUnavailable(_)
                | PurchasesError::RateLimited { .. }
        )
    }

    /// Check if this error stems from infrastructure rather than the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            PurchasesError::Persistence(_) | PurchasesError::SourceUnavailable(_)
        )
    }

    /// Get suggested retry delay in milliseconds.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            PurchasesError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }

    /// Get the error code reported to clients.
    pub fn error_code(&self) -> &'static str {
        match self {
            PurchasesError::Validation { .. } => "VALIDATION_ERROR",
            PurchasesError::ConversionUnavailable { .. } => "CONVERSION_UNAVAILABLE",
            PurchasesError::ConversionOverflow { .. } => "CONVERSION_OVERFLOW",
            PurchasesError::Persistence(_) => "DATABASE_ERROR",
            PurchasesError::SourceUnavailable(_) => "UNEXPECTED_ERROR",
            PurchasesError::RateLimited { .. } => "RATE_LIMITED",
        }
    }
}

/// Result type alias for purchases operations.
pub type Result<T> = std::result::Result<T, PurchasesError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn conversion_unavailable() -> PurchasesError {
        PurchasesError::ConversionUnavailable {
            currency: Currency::new("Euro Zone-Euro"),
            on_or_before: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
        }
    }

    #[test]
    fn test_business_outcomes_are_not_infrastructure() {
        assert!(!conversion_unavailable().is_infrastructure());
        assert!(!conversion_unavailable().is_retryable());
        assert!(!PurchasesError::validation("bad", "amount").is_infrastructure());
    }

    #[test]
    fn test_infrastructure_errors_are_retryable() {
        let persistence = PurchasesError::Persistence("connection refused".into());
        let source = PurchasesError::SourceUnavailable("HTTP 503".into());

        assert!(persistence.is_infrastructure() && persistence.is_retryable());
        assert!(source.is_infrastructure() && source.is_retryable());
    }

    #[test]
    fn test_rate_limited_retry_hint() {
        let err = PurchasesError::RateLimited { retry_after_ms: 640 };
        assert_eq!(err.retry_after_ms(), Some(640));
        assert!(!err.is_infrastructure());
        assert_eq!(conversion_unavailable().retry_after_ms(), None);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(conversion_unavailable().error_code(), "CONVERSION_UNAVAILABLE");
        assert_eq!(PurchasesError::Persistence(String::new()).error_code(), "DATABASE_ERROR");
        assert_eq!(
            PurchasesError::SourceUnavailable(String::new()).error_code(),
            "UNEXPECTED_ERROR"
        );
    }

    #[test]
    fn test_conversion_overflow_is_a_business_outcome() {
        let err = PurchasesError::ConversionOverflow {
            amount: Decimal::MAX,
            rate: Decimal::TWO,
        };

        assert_eq!(err.error_code(), "CONVERSION_OVERFLOW");
        assert!(!err.is_infrastructure());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_display_mentions_window_end() {
        let message = conversion_unavailable().to_string();
        assert!(message.contains("Euro Zone-Euro"));
        assert!(message.contains("2021-01-01"));
    }
}
