//! Fixed-point arithmetic with 18 fractional digits.
//!
//! Token amounts and market rates carry 18 decimal places. Every product and
//! quotient is rounded back to that scale, so multi-hop conversions lose
//! precision below the 18th digit and round trips only match within a
//! tolerance.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits kept for token amounts and rates.
pub const TOKEN_SCALE: u32 = 18;

/// Round a value to [`TOKEN_SCALE`] digits.
pub fn normalize(value: Decimal) -> Decimal {
    value
        .round_dp_with_strategy(TOKEN_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// `a * b` at token scale. `None` on overflow.
pub fn mul(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_mul(b).map(normalize)
}

/// `a / b` at token scale. `None` on division by zero or overflow.
pub fn div(a: Decimal, b: Decimal) -> Option<Decimal> {
    a.checked_div(b).map(normalize)
}

/// `1 / value` at token scale.
pub fn recip(value: Decimal) -> Option<Decimal> {
    div(Decimal::ONE, value)
}
