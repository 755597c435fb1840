//! Explicitly funded issuance source.
//!
//! Issuance is whatever the host has granted and the pool has not yet
//! consumed, independent of time.

use tracing::{debug, warn};

use ballast_core::error::{ArithmeticError, IssuanceError};
use ballast_core::traits::IssuanceSource;
use ballast_core::Decimal;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualIssuance {
    pending: Decimal,
    total_issued: Decimal,
}

impl ManualIssuance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `amount` more reward token available to the pool.
    ///
    /// An overflowing grant is rejected and leaves `pending` unchanged.
    pub fn grant(&mut self, amount: Decimal) -> Result<(), ArithmeticError> {
        self.pending = self.pending.checked_add(amount).inspect_err(|_| {
            warn!(%amount, pending = %self.pending, "issuance: grant overflows pending amount, rejected");
        })?;
        debug!(%amount, pending = %self.pending, "issuance: granted");
        Ok(())
    }

    /// Granted but not yet consumed.
    pub fn pending(&self) -> Decimal {
        self.pending
    }
}

impl IssuanceSource for ManualIssuance {
    fn issuable(&self, _now: u64) -> Result<Decimal, IssuanceError> {
        Ok(self.pending)
    }

    fn mark_issued(&mut self, _now: u64, amount: Decimal) {
        let consumed = amount.min(self.pending);
        self.pending = self.pending.saturating_sub(consumed);
        self.total_issued = match self.total_issued.checked_add(consumed) {
            Ok(total) => total,
            Err(_) => {
                warn!(%consumed, total_issued = %self.total_issued, "issuance: issued total overflows, left unchanged");
                self.total_issued
            }
        };
    }

    fn total_issued(&self) -> Decimal {
        self.total_issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grants_accumulate_until_marked() {
        let mut src = ManualIssuance::new();
        src.grant(Decimal::from_units(3)).unwrap();
        src.grant(Decimal::from_units(4)).unwrap();
        assert_eq!(src.issuable(0).unwrap(), Decimal::from_units(7));
        src.mark_issued(0, Decimal::from_units(7));
        assert_eq!(src.issuable(0).unwrap(), Decimal::ZERO);
        assert_eq!(src.total_issued(), Decimal::from_units(7));
    }

    #[test]
    fn marking_more_than_pending_is_clamped() {
        let mut src = ManualIssuance::new();
        src.grant(Decimal::from_units(2)).unwrap();
        src.mark_issued(0, Decimal::from_units(5));
        assert_eq!(src.pending(), Decimal::ZERO);
        assert_eq!(src.total_issued(), Decimal::from_units(2));
    }

    #[test]
    fn overflowing_grant_is_rejected() {
        let mut src = ManualIssuance::new();
        let huge = Decimal::from_raw(u128::MAX).checked_mul_int(u128::MAX).unwrap();
        src.grant(huge).unwrap();
        assert_eq!(src.grant(huge), Err(ArithmeticError::Overflow));
        assert_eq!(src.pending(), huge);
    }
}
