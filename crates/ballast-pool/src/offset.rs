//! Liquidation offsets: cancel debt against pooled deposits and take in collateral.

use tracing::{debug, info, warn};

use ballast_core::error::ArithmeticError;
use ballast_core::traits::IssuanceSource;
use ballast_core::types::{AccountId, Transfer};
use ballast_core::{Decimal, PoolError};

use crate::compounding::{next_product, offset_per_unit, ProductOutcome};
use crate::ledger::PoolLedger;
use crate::receipt::OffsetOutcome;

impl<I: IssuanceSource> PoolLedger<I> {
    /// Absorb `debt` into the pool and distribute `collateral` pro rata.
    ///
    /// Debt above the pool's total deposits is clamped to it; the resulting
    /// empty pool starts a new epoch.
    ///
    /// # Errors
    ///
    /// - [`PoolError::PreconditionViolated`] if `caller` is not the offset
    ///   authority or the pool holds no deposits
    /// - [`PoolError::Arithmetic`] if the running product would reach zero
    pub fn offset(
        &mut self,
        now: u64,
        caller: AccountId,
        debt: Decimal,
        collateral: Decimal,
    ) -> Result<OffsetOutcome, PoolError> {
        self.atomically(|ledger| ledger.offset_inner(now, caller, debt, collateral))
    }

    fn offset_inner(
        &mut self,
        now: u64,
        caller: AccountId,
        debt: Decimal,
        collateral: Decimal,
    ) -> Result<OffsetOutcome, PoolError> {
        if caller != self.offset_authority() {
            return Err(PoolError::PreconditionViolated(format!(
                "{caller} is not the offset authority"
            )));
        }
        let total = self.scalars.total_deposits;
        if total.is_zero() {
            return Err(PoolError::PreconditionViolated(
                "cannot offset against an empty pool".to_string(),
            ));
        }

        self.trigger_issuance(now)?;

        let debt = if debt > total {
            warn!(%debt, %total, "offset debt exceeds pool deposits, clamping");
            total
        } else {
            debt
        };

        let per_unit = offset_per_unit(
            collateral,
            debt,
            total,
            self.scalars.last_collateral_error,
            self.scalars.last_debt_loss_error,
        )?;
        self.scalars.last_collateral_error = per_unit.collateral_error;
        self.scalars.last_debt_loss_error = per_unit.debt_loss_error;

        // Written into the current cell before epoch or scale can move.
        let cell = self.scalars.cell();
        let marginal = per_unit.gain_per_unit.checked_mul_raw(self.scalars.p)?;
        self.add_collateral_sum(cell, marginal)?;

        let step = next_product(self.scalars.p, per_unit.loss_per_unit)?;
        match step.outcome {
            ProductOutcome::Depleted => {
                self.scalars.epoch = self
                    .scalars
                    .epoch
                    .checked_add(1)
                    .ok_or(ArithmeticError::Overflow)?;
                self.scalars.scale = 0;
                self.scalars.total_deposits = Decimal::ZERO;
                info!(epoch = self.scalars.epoch, "pool depleted, new epoch");
            }
            ProductOutcome::ScaleIncreased => {
                self.scalars.scale = self
                    .scalars
                    .scale
                    .checked_add(1)
                    .ok_or(ArithmeticError::Overflow)?;
                self.scalars.total_deposits = total.checked_sub(debt)?;
                info!(epoch = self.scalars.epoch, scale = self.scalars.scale, "product rescaled");
            }
            ProductOutcome::Compounded => {
                self.scalars.total_deposits = total.checked_sub(debt)?;
            }
        }
        self.scalars.p = step.p;
        self.scalars.collateral_balance = self.scalars.collateral_balance.checked_add(collateral)?;

        let mut transfers = Vec::with_capacity(2);
        if !debt.is_zero() {
            transfers.push(Transfer::BurnDeposit { amount: debt });
        }
        if !collateral.is_zero() {
            transfers.push(Transfer::AcceptCollateral {
                from: caller,
                amount: collateral,
            });
        }

        debug!(
            %debt,
            %collateral,
            loss_per_unit = %per_unit.loss_per_unit,
            gain_per_unit = %per_unit.gain_per_unit,
            p = %step.p,
            total_deposits = %self.scalars.total_deposits,
            "offset"
        );

        Ok(OffsetOutcome {
            debt_absorbed: debt,
            collateral_added: collateral,
            loss_per_unit: per_unit.loss_per_unit,
            gain_per_unit: per_unit.gain_per_unit,
            epoch: self.scalars.epoch,
            scale: self.scalars.scale,
            depleted: step.outcome == ProductOutcome::Depleted,
            scale_changed: step.outcome == ProductOutcome::ScaleIncreased,
            transfers,
        })
    }
}
