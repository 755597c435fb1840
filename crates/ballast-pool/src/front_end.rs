//! Front-end registry and the front-end share of reward token.
//!
//! A front end's stake is the sum of the deposits tagged with it. It
//! compounds with the same `P` as deposits but earns no collateral, and it
//! keeps `1 - kickback` of the reward token its stake accrues.

use tracing::{debug, info};

use ballast_core::traits::IssuanceSource;
use ballast_core::types::{FrontEnd, FrontEndId, Snapshot};
use ballast_core::{Decimal, PoolError};

use crate::compounding::{compounded_stake, gain_from_snapshot};
use crate::ledger::PoolLedger;
use crate::receipt::FrontEndSettlement;

/// Direction of a tagged deposit's change, applied to its front end's stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeChange {
    Increase(Decimal),
    Decrease(Decimal),
}

impl<I: IssuanceSource> PoolLedger<I> {
    /// Register `operator` as a front end forwarding `kickback` of reward gains.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidParameter`] if already registered or `kickback > 1`
    /// - [`PoolError::PreconditionViolated`] if the operator holds a deposit
    pub fn register_front_end(&mut self, operator: FrontEndId, kickback: Decimal) -> Result<FrontEnd, PoolError> {
        self.atomically(|ledger| ledger.register_front_end_inner(operator, kickback))
    }

    fn register_front_end_inner(&mut self, operator: FrontEndId, kickback: Decimal) -> Result<FrontEnd, PoolError> {
        if self.front_ends.contains_key(&operator) {
            return Err(PoolError::InvalidParameter(format!(
                "front end {operator} is already registered"
            )));
        }
        if kickback > Decimal::ONE {
            return Err(PoolError::InvalidParameter(format!(
                "kickback {kickback} exceeds 1"
            )));
        }
        let has_deposit = self
            .deposits
            .get(&operator)
            .is_some_and(|d| !d.initial_value.is_zero());
        if has_deposit {
            return Err(PoolError::PreconditionViolated(format!(
                "{operator} holds a deposit and cannot register as a front end"
            )));
        }

        let front_end = FrontEnd {
            id: operator,
            kickback,
            stake: Decimal::ZERO,
            snapshot: Snapshot::default(),
        };
        self.put_front_end(front_end.clone());
        info!(front_end = %operator, %kickback, "front end registered");
        Ok(front_end)
    }

    /// Kickback rate applied to a depositor's reward gain. Untagged deposits keep everything.
    pub fn kickback_of(&self, tag: Option<FrontEndId>) -> Decimal {
        tag.and_then(|id| self.front_ends.get(&id))
            .map_or(Decimal::ONE, |fe| fe.kickback)
    }

    pub fn compounded_front_end_stake(&self, id: FrontEndId) -> Result<Decimal, PoolError> {
        match self.front_ends.get(&id) {
            Some(fe) => Ok(compounded_stake(fe.stake, &fe.snapshot, &self.scalars)?),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Reward token accrued by a front end's stake, scaled by `1 - kickback`.
    pub fn front_end_reward_gain(&self, id: FrontEndId) -> Result<Decimal, PoolError> {
        let Some(fe) = self.front_ends.get(&id) else {
            return Ok(Decimal::ZERO);
        };
        let raw_gain = gain_from_snapshot(
            fe.stake,
            fe.snapshot.p,
            fe.snapshot.g,
            fe.snapshot.cell(),
            &self.reward_sums,
        )?;
        let share = Decimal::ONE.saturating_sub(fe.kickback);
        Ok(raw_gain.decimal_mul(share)?)
    }

    /// Pay out the front end's pending reward, apply `change` to its
    /// compounded stake and re-snapshot it.
    pub(crate) fn settle_front_end(
        &mut self,
        id: FrontEndId,
        change: StakeChange,
    ) -> Result<FrontEndSettlement, PoolError> {
        let Some(mut fe) = self.front_ends.get(&id).cloned() else {
            return Err(PoolError::InvalidParameter(format!(
                "front end {id} is not registered"
            )));
        };
        let reward_gain = self.front_end_reward_gain(id)?;
        let compounded = self.compounded_front_end_stake(id)?;
        let new_stake = match change {
            StakeChange::Increase(amount) => compounded.checked_add(amount)?,
            // The stake can trail the sum of its deposits by rounding dust.
            StakeChange::Decrease(amount) => compounded.saturating_sub(amount),
        };

        fe.stake = new_stake;
        fe.snapshot = if new_stake.is_zero() {
            Snapshot::default()
        } else {
            self.front_end_snapshot()
        };
        self.put_front_end(fe);

        debug!(front_end = %id, %reward_gain, %new_stake, "front end settled");
        Ok(FrontEndSettlement {
            id,
            reward_gain,
            new_stake,
        })
    }
}
