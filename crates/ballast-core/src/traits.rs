//! Trait interfaces for the pool's external collaborators.
//!
//! - [`IssuanceSource`]: reward-token emission schedule (ballast-issuance implements)
//! - [`Custody`]: token custody and transfer (ballast-node provides an in-memory implementation)
//!
//! The offset source has no trait: it is an account authorised to call
//! `offset` on the ledger.

use crate::decimal::Decimal;
use crate::error::{CustodyError, IssuanceError};
use crate::types::Transfer;

/// Source of reward token issued to the pool over time.
///
/// Reading is pure and consuming is separate, so the ledger can fold the
/// issuable amount into its accumulators and only consume it once the
/// enclosing operation commits.
pub trait IssuanceSource: Send {
    /// Reward token issuable at `now` (unix seconds) that has not yet been marked issued.
    fn issuable(&self, now: u64) -> Result<Decimal, IssuanceError>;

    /// Record `amount`, previously returned by [`issuable`](Self::issuable) for the
    /// same `now`, as issued.
    fn mark_issued(&mut self, now: u64, amount: Decimal);

    /// Cumulative amount marked issued so far.
    fn total_issued(&self) -> Decimal;
}

impl<T: IssuanceSource + ?Sized> IssuanceSource for Box<T> {
    fn issuable(&self, now: u64) -> Result<Decimal, IssuanceError> {
        (**self).issuable(now)
    }

    fn mark_issued(&mut self, now: u64, amount: Decimal) {
        (**self).mark_issued(now, amount)
    }

    fn total_issued(&self) -> Decimal {
        (**self).total_issued()
    }
}

/// Custody of the stable asset, seized collateral and reward token.
///
/// The ledger never calls custody itself: each operation returns the
/// [`Transfer`]s it implies, the host validates them with
/// [`check`](Self::check) before the operation commits and performs them with
/// [`execute`](Self::execute) afterwards.
pub trait Custody: Send {
    /// Verify that every transfer in the batch can be performed, in order.
    fn check(&self, transfers: &[Transfer]) -> Result<(), CustodyError>;

    /// Perform the batch. Must succeed whenever [`check`](Self::check) succeeded
    /// on the same batch and state.
    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), CustodyError>;
}
