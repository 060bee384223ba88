// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Exact conversion between raw on-chain integers and human-scaled amounts.
//!
//! Balances and transfer amounts are always compared as raw integers. The
//! human representation is plain decimal text (`"1.5"`), never a float, so
//! `parse_amount(format_amount(raw, d), d) == raw` holds for every raw value
//! and every supported precision.

use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Highest decimal precision accepted for any asset.
pub const MAX_DECIMALS: u8 = 77;

/// Errors produced while parsing a human-readable amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("too many decimal places (max {0})")]
    TooManyDecimals(u8),

    #[error("amount overflows 256 bits")]
    Overflow,
}

/// A raw asset quantity together with the precision used to display it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount {
    raw: U256,
    decimals: u8,
}

impl Amount {
    pub fn from_raw(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// Parse a human-scaled amount (e.g. `"12.5"`) at the given precision.
    pub fn from_human(amount: &str, decimals: u8) -> Result<Self, AmountError> {
        Ok(Self {
            raw: parse_amount(amount, decimals)?,
            decimals,
        })
    }

    pub fn raw(&self) -> U256 {
        self.raw
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Human-scaled decimal text with trailing zeros trimmed.
    pub fn to_human(&self) -> String {
        format_amount(self.raw, self.decimals)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}

/// Serialized view of an [`Amount`] used in API responses and webhooks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AmountView {
    /// Quantity in the smallest unit (wei, sun, token base units)
    pub raw: String,
    /// Quantity scaled by `decimals`
    pub formatted: String,
    /// Decimal precision used for `formatted`
    pub decimals: u8,
}

impl From<Amount> for AmountView {
    fn from(amount: Amount) -> Self {
        Self {
            raw: amount.raw.to_string(),
            formatted: amount.to_human(),
            decimals: amount.decimals,
        }
    }
}

/// Parse a human-readable amount to the asset's smallest unit.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for BNB/MATIC, 6 for USDT and TRX)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if decimals > MAX_DECIMALS {
        return Err(AmountError::TooManyDecimals(MAX_DECIMALS));
    }

    let (whole, fraction) = split_decimal(amount)?;
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals(decimals));
    }

    let whole = U256::from_str_radix(whole, 10).map_err(|_| AmountError::Overflow)?;

    // Pad the fractional part with zeros to match decimals
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction = if padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&padded, 10).map_err(|_| AmountError::Overflow)?
    };

    whole
        .checked_mul(pow10(decimals))
        .and_then(|w| w.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Check that `amount` is plain non-negative decimal text, independent of
/// any asset precision.
pub fn validate_format(amount: &str) -> Result<(), AmountError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    split_decimal(amount).map(|_| ())
}

/// True when the text denotes zero (`"0"`, `"0.000"`).
pub fn is_zero_text(amount: &str) -> bool {
    amount.trim().chars().all(|c| c == '0' || c == '.')
}

fn split_decimal(amount: &str) -> Result<(&str, &str), AmountError> {
    let (whole, fraction) = match amount.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (amount, ""),
    };

    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }
    if amount.contains('.') && (fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AmountError::InvalidFormat(amount.to_string()));
    }
    Ok((whole, fraction))
}

/// Format a raw amount to human-readable decimal text, keeping full precision.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }
    if decimals > MAX_DECIMALS {
        // 10^decimals does not fit a U256, so every amount is below one unit
        let digits = format!("{:0>width$}", amount.to_string(), width = decimals as usize);
        return format!("0.{}", digits.trim_end_matches('0'));
    }

    let divisor = pow10(decimals);
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder.to_string(), width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// `10^decimals` as a 256-bit integer.
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_amount_beyond_u256_precision() {
        let expected = format!("0.{}1", "0".repeat(93));
        assert_eq!(format_amount(U256::from(1_000_000u64), 100), expected);
        assert_eq!(format_amount(U256::from(15u8), 78), format!("0.{}15", "0".repeat(76)));
    }

    #[test]
    fn test_parse_amount_whole() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_decimal() {
        let result = parse_amount("1.5", 18).unwrap();
        assert_eq!(result, U256::from(1_500_000_000_000_000_000u64));
    }

    #[test]
    fn test_parse_amount_usdt() {
        // 1.5 USDT = 1_500_000 (6 decimals)
        let result = parse_amount("1.5", 6).unwrap();
        assert_eq!(result, U256::from(1_500_000u64));
    }

    #[test]
    fn test_parse_amount_zero_decimals() {
        assert_eq!(parse_amount("42", 0).unwrap(), U256::from(42u64));
        assert_eq!(parse_amount("4.2", 0), Err(AmountError::TooManyDecimals(0)));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("", 6), Err(AmountError::Empty));
        assert!(matches!(parse_amount("-1", 6), Err(AmountError::InvalidFormat(_))));
        assert!(matches!(parse_amount("1.2.3", 6), Err(AmountError::InvalidFormat(_))));
        assert!(matches!(parse_amount("1.", 6), Err(AmountError::InvalidFormat(_))));
        assert!(matches!(parse_amount(".5", 6), Err(AmountError::InvalidFormat(_))));
        assert!(matches!(parse_amount("1e6", 6), Err(AmountError::InvalidFormat(_))));
        assert_eq!(parse_amount("0.0000001", 6), Err(AmountError::TooManyDecimals(6)));
    }

    #[test]
    fn format_validation_ignores_precision() {
        assert!(validate_format("123.4567890123456789012345").is_ok());
        assert!(validate_format("1e6").is_err());
        assert_eq!(validate_format("  "), Err(AmountError::Empty));
        assert!(is_zero_text("0.000"));
        assert!(!is_zero_text("0.001"));
    }

    #[test]
    fn test_parse_amount_overflow() {
        let huge = "9".repeat(80);
        assert_eq!(parse_amount(&huge, 18), Err(AmountError::Overflow));
    }

    #[test]
    fn test_format_amount() {
        let one_bnb = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(format_amount(one_bnb, 18), "1");

        let tiny = U256::from(1u64);
        assert_eq!(format_amount(tiny, 18), "0.000000000000000001");

        assert_eq!(format_amount(U256::from(50_000_000u64), 6), "50");
        assert_eq!(format_amount(U256::ZERO, 6), "0");
    }

    #[test]
    fn amount_view_carries_both_representations() {
        let view = AmountView::from(Amount::from_raw(U256::from(1_250_000u64), 6));
        assert_eq!(view.raw, "1250000");
        assert_eq!(view.formatted, "1.25");
        assert_eq!(view.decimals, 6);
    }

    proptest! {
        #[test]
        fn raw_survives_format_then_parse(raw in any::<u128>(), decimals in 0u8..=18) {
            let raw = U256::from(raw);
            let human = format_amount(raw, decimals);
            prop_assert_eq!(parse_amount(&human, decimals).unwrap(), raw);
        }

        #[test]
        fn raw_equals_human_times_scale(
            whole in 0u64..1_000_000_000_000,
            fraction in 0u64..1_000_000_000_000_000_000,
            decimals in 0u8..=18,
        ) {
            let scale = 10u128.pow(decimals as u32);
            let fraction = (fraction as u128) % scale;
            let human = if decimals == 0 {
                whole.to_string()
            } else {
                format!("{}.{:0>width$}", whole, fraction, width = decimals as usize)
            };
            let expected = U256::from(whole) * U256::from(scale) + U256::from(fraction);
            prop_assert_eq!(parse_amount(&human, decimals).unwrap(), expected);
        }
    }
}
