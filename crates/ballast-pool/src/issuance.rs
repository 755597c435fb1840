//! Coupling between the issuance source and the reward sum `G`.

use tracing::debug;

use ballast_core::traits::IssuanceSource;
use ballast_core::{Decimal, PoolError};

use crate::compounding::reward_per_unit;
use crate::ledger::PoolLedger;

impl<I: IssuanceSource> PoolLedger<I> {
    /// Fold reward token issued since the last operation into `G`.
    ///
    /// Reads the source at most once per operation and only while the pool
    /// holds deposits; the amount is marked issued when the operation commits.
    /// Returns the amount folded in.
    pub(crate) fn trigger_issuance(&mut self, now: u64) -> Result<Decimal, PoolError> {
        let Some(journal) = self.journal.as_ref() else {
            return Err(PoolError::PreconditionViolated(
                "issuance can only be triggered inside an operation".to_string(),
            ));
        };
        if journal.issuance_read() {
            return Ok(Decimal::ZERO);
        }

        let total = self.scalars.total_deposits;
        if total.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let issued = self.issuance.issuable(now)?;
        if let Some(journal) = self.journal.as_mut() {
            journal.mark_issuance(now, issued);
        }
        if issued.is_zero() {
            return Ok(Decimal::ZERO);
        }

        let (per_unit, error) = reward_per_unit(issued, total, self.scalars.last_reward_error)?;
        let marginal = per_unit.checked_mul_raw(self.scalars.p)?;
        let cell = self.scalars.cell();
        let g = self.add_reward_sum(cell, marginal)?;
        self.scalars.last_reward_error = error;

        debug!(now, %issued, %cell, %g, "issuance folded into reward sum");
        Ok(issued)
    }

    /// Reward token the source would release at `now`. Pure.
    pub fn pending_issuance(&self, now: u64) -> Result<Decimal, PoolError> {
        if self.scalars.total_deposits.is_zero() {
            return Ok(Decimal::ZERO);
        }
        Ok(self.issuance.issuable(now)?)
    }
}
