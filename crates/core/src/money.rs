//! Exact-decimal money helpers.
//!
//! Internal summation always happens on raw [`Decimal`] values at full
//! precision. [`Amount`] is the presentation form: rounded once, to two
//! places, and serialized as a fixed-point string (`"1234.50"`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// Number of decimal places used for every presented monetary value.
pub const DISPLAY_SCALE: u32 = 2;

/// A monetary (or percentage) value rounded for presentation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::from_parts(0, 0, 0, false, DISPLAY_SCALE));

    /// Round a raw value half away from zero to two places.
    pub fn round(raw: Decimal) -> Self {
        let mut value = raw.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if value.is_zero() {
            // Drops the sign of negative zero ("-0.00").
            value = Decimal::ZERO;
        }
        value.rescale(DISPLAY_SCALE);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Decimal> for Amount {
    fn from(raw: Decimal) -> Self {
        Self::round(raw)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Decimal::from_str(&raw)
            .map(Amount::round)
            .map_err(serde::de::Error::custom)
    }
}

/// ISO-4217 style currency code attached to every report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::usd()
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency code must be three letters, got {code:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// `numerator / denominator × 100`, or zero when the denominator is zero
/// or the result does not fit a `Decimal`.
pub fn percentage(numerator: Decimal, denominator: Decimal) -> Decimal {
    ratio_or_zero(numerator, denominator)
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero_to_two_places() {
        assert_eq!(Amount::round(dec!(1.005)).to_string(), "1.01");
        assert_eq!(Amount::round(dec!(-1.005)).to_string(), "-1.01");
        assert_eq!(Amount::round(dec!(7)).to_string(), "7.00");
    }

    #[test]
    fn negative_zero_presents_as_zero() {
        assert_eq!(Amount::round(dec!(-0.001)).to_string(), "0.00");
        assert_eq!(Amount::ZERO.to_string(), "0.00");
    }

    #[test]
    fn serializes_as_fixed_point_string() {
        let json = serde_json::to_value(Amount::round(dec!(1234.5))).unwrap();
        assert_eq!(json, serde_json::json!("1234.50"));
    }

    #[test]
    fn division_by_zero_yields_zero() {
        assert_eq!(percentage(dec!(450), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio_or_zero(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage(dec!(450), dec!(950)).round_dp(2), dec!(47.37));
    }

    #[test]
    fn out_of_range_percentage_yields_zero() {
        assert_eq!(percentage(Decimal::MAX, Decimal::ONE), Decimal::ZERO);
        assert_eq!(percentage(dec!(10000000000000000000000000000), Decimal::ONE), Decimal::ZERO);
    }

    #[test]
    fn currency_code_is_normalized() {
        let code: CurrencyCode = " eur ".parse().unwrap();
        assert_eq!(code.as_str(), "EUR");
        assert!("EURO".parse::<CurrencyCode>().is_err());
    }

    proptest! {
        /// Property: rounding is idempotent (rounding a presented value changes nothing).
        #[test]
        fn rounding_is_idempotent(mantissa in -1_000_000_000i64..1_000_000_000i64, scale in 0u32..6) {
            let raw = Decimal::new(mantissa, scale);
            let once = Amount::round(raw);
            prop_assert_eq!(Amount::round(once.value()), once);
        }
    }
}
