//! Fixed-point issuance curve.
//!
//! The fraction of the supply cap issued after `m` whole minutes is
//! `1 - f^m`, where `f < 1` is the per-minute retention factor. All values
//! are 18-decimal raw integers; `u128` intermediates are sufficient because
//! every operand is at most `10^18`.

use ballast_core::constants::{DECIMAL_PRECISION, MAX_ISSUANCE_MINUTES, SECONDS_IN_ONE_MINUTE};
use ballast_core::error::{ArithmeticError, IssuanceError};

/// Fixed-point exponentiation: computes `(base/precision)^exp` in fixed point.
///
/// Binary exponentiation, O(log exp) multiplications, each rounded down.
pub fn fixed_pow(base: u128, exp: u64, precision: u128) -> Result<u128, ArithmeticError> {
    if precision == 0 {
        return Err(ArithmeticError::DivisionByZero);
    }
    if exp == 0 {
        return Ok(precision);
    }

    let mut result = precision;
    let mut b = base;
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result = result.checked_mul(b).ok_or(ArithmeticError::Overflow)? / precision;
        }
        e >>= 1;
        if e > 0 {
            b = b.checked_mul(b).ok_or(ArithmeticError::Overflow)? / precision;
        }
    }

    Ok(result)
}

/// Cumulative fraction of the supply issued after `minutes`, as a raw 18-decimal value.
///
/// `factor_raw` must not exceed `DECIMAL_PRECISION`.
pub fn cumulative_fraction(factor_raw: u128, minutes: u64) -> Result<u128, ArithmeticError> {
    if factor_raw > DECIMAL_PRECISION {
        return Err(ArithmeticError::Overflow);
    }
    let retained = fixed_pow(factor_raw, minutes.min(MAX_ISSUANCE_MINUTES), DECIMAL_PRECISION)?;
    DECIMAL_PRECISION
        .checked_sub(retained)
        .ok_or(ArithmeticError::Underflow)
}

/// Whole minutes elapsed between `deployment` and `now` (unix seconds).
pub fn elapsed_minutes(deployment: u64, now: u64) -> Result<u64, IssuanceError> {
    now.checked_sub(deployment)
        .map(|secs| secs / SECONDS_IN_ONE_MINUTE)
        .ok_or(IssuanceError::ClockBeforeDeployment { now, deployment })
}
