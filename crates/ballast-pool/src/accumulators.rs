//! Global accumulators shared by every depositor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ballast_core::error::ArithmeticError;
use ballast_core::types::EpochScale;
use ballast_core::Decimal;

/// Scalar pool state. Small enough to be copied whole into the undo journal.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlobalScalars {
    /// Running product, `1.0` at the start of every epoch.
    pub p: Decimal,
    pub epoch: u64,
    pub scale: u64,
    pub total_deposits: Decimal,
    /// Collateral held on behalf of depositors and not yet paid out.
    pub collateral_balance: Decimal,
    pub last_collateral_error: Decimal,
    pub last_debt_loss_error: Decimal,
    pub last_reward_error: Decimal,
}

impl Default for GlobalScalars {
    fn default() -> Self {
        Self {
            p: Decimal::ONE,
            epoch: 0,
            scale: 0,
            total_deposits: Decimal::ZERO,
            collateral_balance: Decimal::ZERO,
            last_collateral_error: Decimal::ZERO,
            last_debt_loss_error: Decimal::ZERO,
            last_reward_error: Decimal::ZERO,
        }
    }
}

impl GlobalScalars {
    /// The `(epoch, scale)` cell that offsets and issuance currently write to.
    pub fn cell(&self) -> EpochScale {
        EpochScale::new(self.epoch, self.scale)
    }
}

/// Sparse `(epoch, scale) → sum` table. Missing cells read as zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SumTable {
    cells: BTreeMap<EpochScale, Decimal>,
}

impl SumTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cell: EpochScale) -> Decimal {
        self.cells.get(&cell).copied().unwrap_or(Decimal::ZERO)
    }

    /// Overwrite a cell, returning its previous stored value.
    pub fn set(&mut self, cell: EpochScale, value: Decimal) -> Option<Decimal> {
        self.cells.insert(cell, value)
    }

    /// Add `delta` to a cell and return `(previous stored value, new value)`.
    pub fn add(&mut self, cell: EpochScale, delta: Decimal) -> Result<(Option<Decimal>, Decimal), ArithmeticError> {
        let updated = self.get(cell).checked_add(delta)?;
        Ok((self.set(cell, updated), updated))
    }

    /// Put back a value captured by [`set`](Self::set) or [`add`](Self::add).
    pub fn restore(&mut self, cell: EpochScale, previous: Option<Decimal>) {
        match previous {
            Some(value) => {
                self.cells.insert(cell, value);
            }
            None => {
                self.cells.remove(&cell);
            }
        }
    }

    /// Number of cells ever written.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
