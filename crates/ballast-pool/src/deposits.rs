//! Depositor operations: `provide` and `withdraw`.
//!
//! Both settle the depositor lazily: compounded balance and pending gains are
//! derived from the stored snapshot, paid out, and replaced by a fresh
//! snapshot at the new balance.

use tracing::debug;

use ballast_core::traits::IssuanceSource;
use ballast_core::types::{AccountId, Deposit, FrontEndId, Transfer};
use ballast_core::{Decimal, PoolError};

use crate::compounding::{compounded_stake, gain_from_snapshot};
use crate::front_end::StakeChange;
use crate::ledger::PoolLedger;
use crate::receipt::{FrontEndSettlement, Settlement};

/// A deposit's value and gains since its last interaction.
#[derive(Clone, Copy, Debug)]
struct Pending {
    compounded: Decimal,
    collateral_gain: Decimal,
    reward_gain: Decimal,
}

impl<I: IssuanceSource> PoolLedger<I> {
    /// Add `amount` to `depositor`'s stake, paying out pending gains.
    ///
    /// `front_end` tags the deposit only when it is opened from zero; on an
    /// open deposit the existing tag is kept.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidAmount`] if `amount` is zero
    /// - [`PoolError::InvalidParameter`] if `front_end` is not registered
    /// - [`PoolError::PreconditionViolated`] if `depositor` is a registered front end
    pub fn provide(
        &mut self,
        now: u64,
        depositor: AccountId,
        amount: Decimal,
        front_end: Option<FrontEndId>,
    ) -> Result<Settlement, PoolError> {
        self.atomically(|ledger| ledger.provide_inner(now, depositor, amount, front_end))
    }

    /// Withdraw up to the compounded balance; `amount = 0` only claims gains.
    ///
    /// A deposit that has compounded to zero is closed and withdraws nothing.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PreconditionViolated`] if `depositor` has no deposit
    /// - [`PoolError::InsufficientBalance`] if `amount` exceeds a non-zero compounded balance
    pub fn withdraw(&mut self, now: u64, depositor: AccountId, amount: Decimal) -> Result<Settlement, PoolError> {
        self.atomically(|ledger| ledger.withdraw_inner(now, depositor, amount))
    }

    fn provide_inner(
        &mut self,
        now: u64,
        depositor: AccountId,
        amount: Decimal,
        front_end: Option<FrontEndId>,
    ) -> Result<Settlement, PoolError> {
        if amount.is_zero() {
            return Err(PoolError::InvalidAmount);
        }
        if self.front_ends.contains_key(&depositor) {
            return Err(PoolError::PreconditionViolated(format!(
                "front end {depositor} cannot deposit"
            )));
        }
        if let Some(tag) = front_end {
            if !self.front_ends.contains_key(&tag) {
                return Err(PoolError::InvalidParameter(format!(
                    "front end {tag} is not registered"
                )));
            }
        }

        self.trigger_issuance(now)?;

        let existing = self
            .deposits
            .get(&depositor)
            .cloned()
            .unwrap_or_else(|| Deposit::empty(depositor));
        let tag = if existing.initial_value.is_zero() {
            front_end
        } else {
            existing.front_end
        };

        let pending = self.pending_of(&existing)?;
        let front_end_settlement = match tag {
            Some(id) => Some(self.settle_front_end(id, StakeChange::Increase(amount))?),
            None => None,
        };

        let new_deposit = pending.compounded.checked_add(amount)?;
        self.scalars.total_deposits = self.scalars.total_deposits.checked_add(amount)?;
        self.scalars.collateral_balance = self
            .scalars
            .collateral_balance
            .checked_sub(pending.collateral_gain)?;

        self.store_deposit(depositor, new_deposit, tag);

        let transfers = payout_transfers(
            depositor,
            &pending,
            front_end_settlement.as_ref(),
            Transfer::PullDeposit {
                from: depositor,
                amount,
            },
        );

        debug!(
            %depositor,
            %amount,
            compounded = %pending.compounded,
            %new_deposit,
            collateral_gain = %pending.collateral_gain,
            reward_gain = %pending.reward_gain,
            "provide"
        );

        Ok(Settlement {
            depositor,
            compounded_before: pending.compounded,
            deposit_loss: existing.initial_value.saturating_sub(pending.compounded),
            new_deposit,
            collateral_gain: pending.collateral_gain,
            reward_gain: pending.reward_gain,
            front_end: front_end_settlement,
            transfers,
        })
    }

    fn withdraw_inner(&mut self, now: u64, depositor: AccountId, amount: Decimal) -> Result<Settlement, PoolError> {
        let existing = match self.deposits.get(&depositor) {
            Some(d) if !d.initial_value.is_zero() => d.clone(),
            _ => {
                return Err(PoolError::PreconditionViolated(format!(
                    "{depositor} has no deposit"
                )));
            }
        };

        self.trigger_issuance(now)?;

        let pending = self.pending_of(&existing)?;
        if amount > pending.compounded && !pending.compounded.is_zero() {
            return Err(PoolError::InsufficientBalance {
                available: pending.compounded,
                requested: amount,
            });
        }
        let withdrawn = amount.min(pending.compounded);

        let front_end_settlement = match existing.front_end {
            Some(id) => Some(self.settle_front_end(id, StakeChange::Decrease(withdrawn))?),
            None => None,
        };

        let new_deposit = pending.compounded.checked_sub(withdrawn)?;
        // Σ compounded deposits never exceeds the total; the floor absorbs rounding.
        self.scalars.total_deposits = self.scalars.total_deposits.saturating_sub(withdrawn);
        self.scalars.collateral_balance = self
            .scalars
            .collateral_balance
            .checked_sub(pending.collateral_gain)?;

        self.store_deposit(depositor, new_deposit, existing.front_end);

        let transfers = payout_transfers(
            depositor,
            &pending,
            front_end_settlement.as_ref(),
            Transfer::ReleaseDeposit {
                to: depositor,
                amount: withdrawn,
            },
        );

        debug!(
            %depositor,
            requested = %amount,
            %withdrawn,
            compounded = %pending.compounded,
            %new_deposit,
            collateral_gain = %pending.collateral_gain,
            reward_gain = %pending.reward_gain,
            "withdraw"
        );

        Ok(Settlement {
            depositor,
            compounded_before: pending.compounded,
            deposit_loss: existing.initial_value.saturating_sub(pending.compounded),
            new_deposit,
            collateral_gain: pending.collateral_gain,
            reward_gain: pending.reward_gain,
            front_end: front_end_settlement,
            transfers,
        })
    }

    fn pending_of(&self, deposit: &Deposit) -> Result<Pending, PoolError> {
        let snap = &deposit.snapshot;
        let compounded = compounded_stake(deposit.initial_value, snap, &self.scalars)?;
        let collateral_gain = gain_from_snapshot(
            deposit.initial_value,
            snap.p,
            snap.s,
            snap.cell(),
            &self.collateral_sums,
        )?;
        let raw_reward = gain_from_snapshot(
            deposit.initial_value,
            snap.p,
            snap.g,
            snap.cell(),
            &self.reward_sums,
        )?;
        let reward_gain = raw_reward.decimal_mul(self.kickback_of(deposit.front_end))?;
        Ok(Pending {
            compounded,
            collateral_gain,
            reward_gain,
        })
    }

    /// Re-snapshot a deposit at `value`; a zero value closes the record and drops its tag.
    fn store_deposit(&mut self, owner: AccountId, value: Decimal, tag: Option<FrontEndId>) {
        if value.is_zero() {
            self.put_deposit(owner, None);
            return;
        }
        let snapshot = self.depositor_snapshot();
        self.put_deposit(
            owner,
            Some(Deposit {
                owner,
                initial_value: value,
                front_end: tag,
                snapshot,
            }),
        );
    }
}

fn payout_transfers(
    depositor: AccountId,
    pending: &Pending,
    front_end: Option<&FrontEndSettlement>,
    principal: Transfer,
) -> Vec<Transfer> {
    let mut transfers = Vec::with_capacity(4);
    if !pending.reward_gain.is_zero() {
        transfers.push(Transfer::PayReward {
            to: depositor,
            amount: pending.reward_gain,
        });
    }
    if let Some(fe) = front_end.filter(|fe| !fe.reward_gain.is_zero()) {
        transfers.push(Transfer::PayReward {
            to: fe.id,
            amount: fe.reward_gain,
        });
    }
    if !principal.amount().is_zero() {
        transfers.push(principal);
    }
    if !pending.collateral_gain.is_zero() {
        transfers.push(Transfer::PayCollateral {
            to: depositor,
            amount: pending.collateral_gain,
        });
    }
    transfers
}
