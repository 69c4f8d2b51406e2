use bigdecimal::{BigDecimal, RoundingMode, Zero};
use num_bigint::{BigInt, BigUint};
use tracing::debug;

/// Convert an integer balance in an asset's smallest unit into a decimal
/// quantity with `decimals` fractional digits.
///
/// The input must be an unsigned base-10 integer (`^[0-9]+$`). Anything else,
/// including the empty string, converts to zero instead of failing so that a
/// single malformed upstream value cannot abort a whole snapshot.
///
/// # Examples
/// - `to_decimal("1000000000000000000", 18)` is `1`
/// - `to_decimal("1500000000000000000", 18)` is `1.5`
/// - `to_decimal("1000000", 6)` is `1`
pub fn to_decimal(raw: &str, decimals: u32) -> BigDecimal {
    match parse_unsigned(raw) {
        Some(units) => BigDecimal::new(BigInt::from(units), i64::from(decimals))
            .with_scale_round(i64::from(decimals), RoundingMode::HalfUp),
        None => {
            debug!("Malformed balance {:?}, treating as zero", raw);
            BigDecimal::zero()
        }
    }
}

/// Parse an unsigned base-10 integer of arbitrary size.
fn parse_unsigned(raw: &str) -> Option<BigUint> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(raw.as_bytes(), 10)
}

/// Round `value` to `scale` fractional digits, half-up.
pub fn round_half_up(value: &BigDecimal, scale: i64) -> BigDecimal {
    value.with_scale_round(scale, RoundingMode::HalfUp)
}
