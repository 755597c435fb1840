//! Error types for the Ballast pool.
use thiserror::Error;

use crate::decimal::Decimal;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticError {
    #[error("arithmetic overflow")] Overflow,
    #[error("arithmetic underflow")] Underflow,
    #[error("division by zero")] DivisionByZero,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseDecimalError {
    #[error("empty decimal string")] Empty,
    #[error("invalid decimal string: {0}")] Invalid(String),
    #[error("too many fractional digits: {0} > 18")] TooManyDecimals(usize),
    #[error("decimal out of range")] OutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    #[error("clock {now} is before deployment time {deployment}")] ClockBeforeDeployment { now: u64, deployment: u64 },
    #[error("issuance factor {0} exceeds 1.0")] InvalidFactor(Decimal),
    #[error(transparent)] Arithmetic(#[from] ArithmeticError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CustodyError {
    #[error("insufficient {asset} funds for {account}: have {have}, need {need}")]
    InsufficientFunds { account: String, asset: &'static str, have: Decimal, need: Decimal },
    #[error("insufficient {asset} reserve: have {have}, need {need}")]
    InsufficientReserve { asset: &'static str, have: Decimal, need: Decimal },
    #[error(transparent)] Arithmetic(#[from] ArithmeticError),
}

/// Every failure a pool operation can report.
///
/// All variants are raised before the operation commits: the ledger is left
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("amount must be non-zero")] InvalidAmount,
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Decimal, requested: Decimal },
    #[error("precondition violated: {0}")] PreconditionViolated(String),
    #[error("invalid parameter: {0}")] InvalidParameter(String),
    #[error("reentrant call rejected")] ReentrancyDetected,
    #[error(transparent)] Arithmetic(#[from] ArithmeticError),
    #[error(transparent)] Issuance(#[from] IssuanceError),
    #[error(transparent)] Custody(#[from] CustodyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_converts_into_pool_error() {
        let err: PoolError = ArithmeticError::Overflow.into();
        assert_eq!(err, PoolError::Arithmetic(ArithmeticError::Overflow));
        assert_eq!(err.to_string(), "arithmetic overflow");
    }

    #[test]
    fn insufficient_balance_message_shows_amounts() {
        let err = PoolError::InsufficientBalance {
            available: Decimal::from_units(5),
            requested: Decimal::from_units(7),
        };
        assert_eq!(err.to_string(), "insufficient balance: available 5, requested 7");
    }

    #[test]
    fn custody_error_is_transparent() {
        let err: PoolError = CustodyError::InsufficientReserve {
            asset: "collateral",
            have: Decimal::ZERO,
            need: Decimal::ONE,
        }
        .into();
        assert_eq!(err.to_string(), "insufficient collateral reserve: have 0, need 1");
    }
}
