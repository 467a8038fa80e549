//! Amount Conversion
//!
//! Exact conversion between human-readable native amounts and on-chain smallest
//! units (lamports / nanoTON). Both chains use 9 decimal places. All pipeline
//! arithmetic stays in integers; `Decimal` appears only at the API boundary.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

/// Decimal places of the native asset on both supported chains
pub const NATIVE_DECIMALS: u32 = 9;

/// Smallest units per one native unit (10^9)
pub const UNITS_PER_NATIVE: u64 = 1_000_000_000;

/// Basis points denominator (100% = 10_000 bps)
pub const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount must be positive, got {0}")]
    NonPositive(Decimal),

    #[error("amount {0} has more than {NATIVE_DECIMALS} decimal places")]
    TooPrecise(Decimal),

    #[error("amount {0} exceeds the representable on-chain range")]
    Overflow(Decimal),
}

/// Convert a human-unit amount to smallest units.
///
/// Rejects amounts with more than 9 decimal places instead of silently
/// truncating; a sub-lamport request is a caller bug.
pub fn to_smallest_unit(amount: Decimal) -> Result<u64, AmountError> {
    if amount <= Decimal::ZERO {
        return Err(AmountError::NonPositive(amount));
    }

    let scaled = amount
        .checked_mul(Decimal::from(UNITS_PER_NATIVE))
        .ok_or(AmountError::Overflow(amount))?;

    if scaled.fract() != Decimal::ZERO {
        return Err(AmountError::TooPrecise(amount));
    }

    scaled.to_u64().ok_or(AmountError::Overflow(amount))
}

/// Convert smallest units to a human-unit decimal. Exact by construction.
pub fn to_human_unit(raw: u64) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, NATIVE_DECIMALS)
}

/// Minimum acceptable output after slippage:
/// `floor(quoted * (10000 - slippage_bps) / 10000)`.
///
/// Integer arithmetic in `u128` so the multiply cannot overflow and the floor
/// is exact. `slippage_bps = 0` returns the quoted amount unchanged.
pub fn min_output_raw(quoted_raw: u64, slippage_bps: u16) -> u64 {
    let bps = (slippage_bps as u64).min(BPS_DENOMINATOR);
    let numerator = quoted_raw as u128 * (BPS_DENOMINATOR - bps) as u128;
    (numerator / BPS_DENOMINATOR as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_to_smallest_unit_whole() {
        assert_eq!(to_smallest_unit(dec!(1)).unwrap(), 1_000_000_000);
        assert_eq!(to_smallest_unit(dec!(0.5)).unwrap(), 500_000_000);
        assert_eq!(to_smallest_unit(dec!(0.000000001)).unwrap(), 1);
    }

    #[test]
    fn test_to_smallest_unit_rejects_non_positive() {
        assert!(matches!(
            to_smallest_unit(dec!(0)),
            Err(AmountError::NonPositive(_))
        ));
        assert!(matches!(
            to_smallest_unit(dec!(-1.5)),
            Err(AmountError::NonPositive(_))
        ));
    }

    #[test]
    fn test_to_smallest_unit_rejects_sub_lamport() {
        assert!(matches!(
            to_smallest_unit(dec!(0.0000000001)),
            Err(AmountError::TooPrecise(_))
        ));
    }

    #[test]
    fn test_round_trip_exact() {
        // No float drift for any raw value
        for raw in [0u64, 1, 999_999_999, 1_000_000_000, 123_456_789_012, u32::MAX as u64] {
            assert_eq!(to_human_unit(raw) * Decimal::from(UNITS_PER_NATIVE), Decimal::from(raw));
        }
        for raw in [1u64, 42, 1_000_000_000, 987_654_321_123] {
            assert_eq!(to_smallest_unit(to_human_unit(raw)).unwrap(), raw);
        }
    }

    #[test]
    fn test_min_output_zero_slippage_is_identity() {
        assert_eq!(min_output_raw(1_000_000_000, 0), 1_000_000_000);
        assert_eq!(min_output_raw(u64::MAX, 0), u64::MAX);
    }

    #[test]
    fn test_min_output_five_percent() {
        // 0.5 SOL quote at 500 bps: 1_000_000_000 -> 950_000_000
        assert_eq!(min_output_raw(1_000_000_000, 500), 950_000_000);
    }

    #[test]
    fn test_min_output_floors() {
        // 9999 * 9999 / 10000 = 9998.0001 -> 9998
        assert_eq!(min_output_raw(9_999, 1), 9_998);
        // 1 unit at 1 bps still floors down
        assert_eq!(min_output_raw(1, 1), 0);
    }

    #[test]
    fn test_min_output_never_exceeds_quote() {
        for bps in [0u16, 1, 50, 500, 9_999, 10_000] {
            for quoted in [0u64, 1, 999, 1_000_000_000, u64::MAX] {
                assert!(min_output_raw(quoted, bps) <= quoted);
            }
        }
    }

    #[test]
    fn test_min_output_full_slippage_is_zero() {
        assert_eq!(min_output_raw(1_000_000_000, 10_000), 0);
    }
}
