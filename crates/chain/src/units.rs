use crate::error::ChainError;
use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Scales a human amount ("1000.5") to integer base units for a token with
/// `decimals` decimals.
///
/// Amounts with more fractional digits than the token supports are rejected
/// rather than silently rounded, as are negative amounts.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256, ChainError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ChainError::Units(format!("negative amount {amount}")));
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > u32::from(decimals) {
        return Err(ChainError::Units(format!(
            "{amount} has more than {decimals} fractional digits"
        )));
    }

    let mantissa = u128::try_from(amount.mantissa())
        .map_err(|_| ChainError::Units(format!("amount {amount} out of range")))?;
    let factor = U256::from(10u64).pow(U256::from(u32::from(decimals) - scale));
    U256::from(mantissa)
        .checked_mul(factor)
        .ok_or_else(|| ChainError::Units(format!("amount {amount} overflows uint256")))
}

/// Renders integer base units as a decimal string with trailing zeros removed
/// (`1000300000` with 6 decimals is `"1000.3"`, zero is `"0"`).
pub fn format_base_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = usize::from(decimals);
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
    let frac_part = frac_part.trim_end_matches('0');

    if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn scales_by_token_decimals() {
        assert_eq!(to_base_units(dec!(1000.3), 6).unwrap(), U256::from(1_000_300_000u64));
        assert_eq!(to_base_units(dec!(1), 18).unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(to_base_units(dec!(25.000), 0).unwrap(), U256::from(25u64));
    }

    #[test]
    fn rejects_excess_precision_and_negatives() {
        assert!(to_base_units(dec!(0.0000001), 6).is_err());
        assert!(to_base_units(dec!(-5), 6).is_err());
    }

    #[test]
    fn formats_with_trimmed_fraction() {
        assert_eq!(format_base_units(U256::from(1_000_300_000u64), 6), "1000.3");
        assert_eq!(format_base_units(U256::ZERO, 18), "0");
        assert_eq!(format_base_units(U256::from(5u64), 6), "0.000005");
        assert_eq!(format_base_units(U256::from(7_000_000u64), 6), "7");
        assert_eq!(format_base_units(U256::from(42u64), 0), "42");
    }
}
