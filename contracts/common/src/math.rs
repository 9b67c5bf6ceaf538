//! Mathematical Utilities for TBOND Protocol
//!
//! Safe math operations and bond accounting calculations.
//!
//! Amounts carry 18 (principal, bond) or 27 (wrapped principal) decimals, so
//! the product of two amounts can exceed `u128`. `mul_div` keeps a 256-bit
//! intermediate and only fails if the final quotient does not fit.

use crate::constants::{fees, token};
use crate::errors::{TBondError, TBondResult};
use crate::types::Amount;

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 256-bit product of two `u128` values as `(high, low)` halves
fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let (a_hi, a_lo) = (a >> 64, a & LOW_MASK);
    let (b_hi, b_lo) = (b >> 64, b & LOW_MASK);

    let lo_lo = a_lo * b_lo;
    let lo_hi = a_lo * b_hi;
    let hi_lo = a_hi * b_lo;
    let hi_hi = a_hi * b_hi;

    // At most 3 * (2^64 - 1), cannot overflow
    let mid = (lo_lo >> 64) + (lo_hi & LOW_MASK) + (hi_lo & LOW_MASK);

    let low = (lo_lo & LOW_MASK) | (mid << 64);
    let high = hi_hi + (lo_hi >> 64) + (hi_lo >> 64) + (mid >> 64);
    (high, low)
}

/// Compute `floor(a * b / denominator)` without intermediate overflow.
///
/// # Errors
/// * `DivisionByZero` if `denominator` is zero
/// * `Overflow` if the quotient does not fit in `u128`
pub fn mul_div(a: u128, b: u128, denominator: u128) -> TBondResult<u128> {
    if denominator == 0 {
        return Err(TBondError::DivisionByZero);
    }

    let (high, low) = widening_mul(a, b);
    if high == 0 {
        return Ok(low / denominator);
    }
    if high >= denominator {
        return Err(TBondError::Overflow);
    }

    // Shift-subtract long division of (high, low) by denominator.
    // Invariant: remainder < denominator at the top of each iteration.
    let mut remainder = high;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= 1;
        }
    }

    Ok(quotient)
}

/// Safe addition with overflow check
pub fn safe_add(a: Amount, b: Amount) -> TBondResult<Amount> {
    a.checked_add(b).ok_or(TBondError::Overflow)
}

/// Safe subtraction with underflow check
pub fn safe_sub(a: Amount, b: Amount) -> TBondResult<Amount> {
    a.checked_sub(b).ok_or(TBondError::Underflow)
}

/// Safe tick addition for deadlines
pub fn tick_add(now: u64, period: u64) -> TBondResult<u64> {
    now.checked_add(period).ok_or(TBondError::Overflow)
}

/// Apply a basis-point rate to an amount, truncating
pub fn apply_bps(amount: Amount, bps: u64) -> TBondResult<Amount> {
    mul_div(amount, bps as u128, fees::BPS_DENOMINATOR as u128)
}

/// Staking incentive for a round
///
/// incentive = (total_held - seed) * incentive_bps / 10000
pub fn calculate_incentive(
    total_held: Amount,
    seed: Amount,
    incentive_bps: u64,
) -> TBondResult<Amount> {
    let post_seed = safe_sub(total_held, seed)?;
    apply_bps(post_seed, incentive_bps)
}

/// Normalize a wrapped amount to principal units, truncating dust
pub fn wrapped_to_principal(wrapped: Amount) -> Amount {
    wrapped / token::WRAPPED_SCALE
}

/// Scale a principal amount up to wrapped units
pub fn principal_to_wrapped(principal: Amount) -> TBondResult<Amount> {
    principal
        .checked_mul(token::WRAPPED_SCALE)
        .ok_or(TBondError::Overflow)
}
