//! Currency marshaling between canonical minor units and decimal major units
//!
//! Canonical amounts everywhere in the system are `i64` minor units (cents).
//! Store A persists the same integers unchanged. Store B persists decimal
//! major units, so its adapters convert exactly once at the boundary with
//! the pair of functions here: division by 100 on write, multiplication by
//! 100 with round-half-away-from-zero on read.
//!
//! The conversion is exact for every `i64` because `Decimal` represents
//! two fractional digits exactly; for arbitrary decimals the write-then-read
//! loss is bounded by one minor unit. Both properties are asserted below.
//!
//! Rates marshal with the same rule: canonical hundredths of a percent,
//! wire decimal percent.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Errors that can occur during currency marshaling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    /// The decimal amount does not fit in an i64 after scaling
    #[error("amount {0} overflows the minor-unit range")]
    Overflow(Decimal),
}

/// Converts canonical minor units to the decimal major-unit wire form
///
/// Exact for all inputs: `Decimal::new(n, 2)` is `n / 100` with no rounding.
pub fn to_major_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

/// Converts a decimal major-unit wire value back to canonical minor units
///
/// Multiplies by 100 and rounds half away from zero. Errors only when the
/// scaled value does not fit in an `i64`.
pub fn to_minor_units(major: Decimal) -> Result<i64, MoneyError> {
    let scaled = major
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::Overflow(major))?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(MoneyError::Overflow(major))
}

/// Rounds a decimal amount of minor units to the nearest whole minor unit
///
/// Used when projections scale minor-unit amounts by fractional factors.
/// Saturates at the `i64` range instead of failing; projection totals are
/// display values, not ledger entries.
pub fn round_minor(amount: Decimal) -> i64 {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Write-then-read is exact for every canonical amount
        #[test]
        fn minor_round_trip_is_exact(minor in i64::MIN..i64::MAX) {
            prop_assert_eq!(to_minor_units(to_major_units(minor)).unwrap(), minor);
        }

        /// For arbitrary decimals the loss is bounded by one minor unit
        #[test]
        fn arbitrary_decimal_loss_is_at_most_one_minor_unit(
            mantissa in -1_000_000_000_000i64..1_000_000_000_000i64,
            scale in 0u32..6u32
        ) {
            let major = Decimal::new(mantissa, scale);
            let minor = to_minor_units(major).unwrap();
            let round_tripped = to_major_units(minor);
            let loss = (round_tripped - major).abs();
            prop_assert!(loss <= Decimal::new(1, 2), "loss {} exceeds one minor unit", loss);
        }
    }
}
