//! Token amount conversion
//!
//! Amounts arrive as decimal strings typed by a user and leave as decimal
//! strings for display. Both directions are exact; nothing goes through `f64`.

use alloy::primitives::{utils, U256};

use crate::error::SwapError;

/// Decimals of the stablecoins carried by the pools (USDC/USDT)
pub const TOKEN_DECIMALS: u8 = 6;

/// Decimal digits that always fit in a `U256`
const MAX_DIGITS: usize = 77;

/// Convert a human-readable amount into raw token units
///
/// Rejects empty input, anything that is not a plain non-negative decimal
/// number, zero, and values with more fractional digits than `decimals`.
/// alloy's `parse_units` truncates excess precision and wraps on overflow,
/// so both are caught here first.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, SwapError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() {
        return Err(SwapError::invalid_amount(amount, "amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(SwapError::invalid_amount(amount, "amount must be positive"));
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(SwapError::invalid_amount(amount, "not a decimal number"));
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(whole) || !all_digits(fraction) {
        return Err(SwapError::invalid_amount(amount, "not a decimal number"));
    }
    if fraction.len() > decimals as usize {
        return Err(SwapError::invalid_amount(
            amount,
            format!("at most {} decimal places allowed", decimals),
        ));
    }
    if whole.trim_start_matches('0').len() + decimals as usize > MAX_DIGITS {
        return Err(SwapError::invalid_amount(amount, "amount is too large"));
    }

    let raw: U256 = utils::parse_units(trimmed, decimals)
        .map_err(|e| SwapError::invalid_amount(amount, e.to_string()))?
        .into();
    if raw.is_zero() {
        return Err(SwapError::invalid_amount(
            amount,
            "amount must be greater than zero",
        ));
    }

    Ok(raw)
}

/// Convert raw token units into a human-readable amount
///
/// Trailing fractional zeros are dropped: `1500000` at 6 decimals is `"1.5"`.
pub fn format_units(raw: U256, decimals: u8) -> String {
    let Ok(formatted) = utils::format_units(raw, decimals) else {
        return raw.to_string();
    };

    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, fraction)
            }
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units_whole_and_fractional() {
        assert_eq!(
            parse_units("1000", TOKEN_DECIMALS).unwrap(),
            U256::from(1_000_000_000u64)
        );
        assert_eq!(
            parse_units("1.5", TOKEN_DECIMALS).unwrap(),
            U256::from(1_500_000u64)
        );
        assert_eq!(
            parse_units("0.000001", TOKEN_DECIMALS).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(parse_units(".25", TOKEN_DECIMALS).unwrap(), U256::from(250_000u64));
        assert_eq!(parse_units(" 42 ", TOKEN_DECIMALS).unwrap(), U256::from(42_000_000u64));
    }

    #[test]
    fn test_parse_units_rejects_non_positive() {
        for input in ["0", "0.0", "-1", "-0.5", "000"] {
            let err = parse_units(input, TOKEN_DECIMALS).unwrap_err();
            assert!(
                matches!(err, SwapError::InvalidAmount { .. }),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_units_rejects_garbage() {
        for input in ["", "   ", "abc", "1e6", "1.2.3", "+5", ".", "12,000", "0x10"] {
            assert!(
                parse_units(input, TOKEN_DECIMALS).is_err(),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_units_rejects_excess_precision() {
        let err = parse_units("1.0000001", TOKEN_DECIMALS).unwrap_err();
        assert!(err.to_string().contains("at most 6 decimal places"));
    }

    #[test]
    fn test_parse_units_rejects_overflow() {
        let huge = "9".repeat(90);
        assert!(parse_units(&huge, TOKEN_DECIMALS).is_err());

        // Fits before scaling, overflows after multiplying by 10^6
        let wraps = "9".repeat(75);
        let err = parse_units(&wraps, TOKEN_DECIMALS).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1_000_000_000u64), 6), "1000");
        assert_eq!(format_units(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_units(U256::ZERO, 6), "0");
        assert_eq!(format_units(U256::from(123u64), 0), "123");
        assert_eq!(
            format_units(U256::from(2_500_000_000_000_000_000u128), 18),
            "2.5"
        );
    }
}
