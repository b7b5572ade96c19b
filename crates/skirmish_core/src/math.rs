//! Fixed-point helpers for percentage modifiers.
//!
//! Damage modifiers such as "70% of incoming ranged damage" are applied
//! with fixed-point arithmetic so results never depend on float rounding.

use fixed::types::I32F32;

/// Fixed-point number type used for modifier math.
pub type Fixed = I32F32;

/// Scale `amount` by `percent` / 100, truncating toward zero.
///
/// The multiplication happens before the division, so the result is the
/// exact integer part of `amount * percent / 100`. Amounts too large for
/// the fixed-point range saturate.
#[must_use]
pub fn scale_percent(amount: u32, percent: u32) -> u32 {
    let scaled = Fixed::saturating_from_num(amount).saturating_mul(Fixed::from_num(percent))
        / Fixed::from_num(100);
    scaled.to_num::<i64>().max(0) as u32
}
