//! Fixed-point currency conversion.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{FxError, FxResult};

/// Decimal places kept in converted amounts.
pub const DEFAULT_SCALE: u32 = 2;

/// Applies exchange rates to amounts.
///
/// Results are rounded half-up to `scale` decimal places. Amounts and rates
/// are never negative here, so `MidpointAwayFromZero` is exactly half-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyConverter {
    scale: u32,
}

impl CurrencyConverter {
    /// Create a converter rounding to `scale` decimal places.
    pub fn new(scale: u32) -> Self {
        Self { scale }
    }

    /// Decimal places kept in converted amounts.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Convert `amount` at `rate`.
    pub fn convert(&self, amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
        let product = amount
            .checked_mul(rate)
            .ok_or(FxError::ConversionOverflow { amount, rate })?;

        let mut rounded =
            product.round_dp_with_strategy(self.scale, RoundingStrategy::MidpointAwayFromZero);
        // Keep a fixed number of places in the output, e.g. 82 -> 82.00.
        rounded.rescale(self.scale);

        Ok(rounded)
    }
}

impl Default for CurrencyConverter {
    fn default() -> Self {
        Self::new(DEFAULT_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_up_at_boundary() {
        let converter = CurrencyConverter::default();
        assert_eq!(converter.convert(dec!(10.005), dec!(1)).unwrap(), dec!(10.01));
        assert_eq!(converter.convert(dec!(10.004), dec!(1)).unwrap(), dec!(10.00));
    }

    #[test]
    fn test_convert_applies_rate() {
        let converter = CurrencyConverter::default();
        assert_eq!(converter.convert(dec!(100), dec!(0.82)).unwrap(), dec!(82.00));
        assert_eq!(converter.convert(dec!(19.99), dec!(1.3579)).unwrap(), dec!(27.14));
    }

    #[test]
    fn test_output_keeps_fixed_scale() {
        let converted = CurrencyConverter::default()
            .convert(dec!(100), dec!(0.82))
            .unwrap();
        assert_eq!(converted.scale(), 2);
        assert_eq!(converted.to_string(), "82.00");
    }

    #[test]
    fn test_custom_scale() {
        let converter = CurrencyConverter::new(0);
        assert_eq!(converter.convert(dec!(100), dec!(110.555)).unwrap(), dec!(11056));
        assert_eq!(converter.scale(), 0);
    }

    #[test]
    fn test_zero_amount() {
        let converted = CurrencyConverter::default()
            .convert(dec!(0), dec!(5.123))
            .unwrap();
        assert!(converted.is_zero());
    }

    #[test]
    fn test_overflow_is_reported() {
        let result = CurrencyConverter::default().convert(Decimal::MAX, dec!(2));
        assert!(matches!(result, Err(FxError::ConversionOverflow { .. })));
    }

    proptest! {
        #[test]
        fn prop_conversion_is_deterministic(cents in 0i64..10_000_000_000, rate_units in 1i64..100_000_000) {
            let amount = Decimal::new(cents, 3);
            let rate = Decimal::new(rate_units, 6);
            let converter = CurrencyConverter::default();

            let first = converter.convert(amount, rate).unwrap();
            let second = converter.convert(amount, rate).unwrap();

            prop_assert_eq!(first, second);
            prop_assert_eq!(first.scale(), 2);
            // Rounding moves the exact product by at most half a cent.
            prop_assert!((first - amount * rate).abs() <= dec!(0.005));
        }
    }
}
