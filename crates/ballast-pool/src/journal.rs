//! Undo journal for in-flight ledger operations.
//!
//! While an operation runs, every overwritten cell, deposit and front-end
//! record is pushed here with its prior value, and the scalar block is
//! captured once at the start. Rolling back replays the entries in reverse.

use ballast_core::types::{AccountId, Deposit, EpochScale, FrontEnd, FrontEndId};
use ballast_core::Decimal;

use crate::accumulators::GlobalScalars;

/// A prior value to put back on rollback. `None` means the entry did not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UndoEntry {
    CollateralSum(EpochScale, Option<Decimal>),
    RewardSum(EpochScale, Option<Decimal>),
    Deposit(AccountId, Option<Deposit>),
    FrontEnd(FrontEndId, Option<FrontEnd>),
}

#[derive(Clone, Debug)]
pub struct Journal {
    scalars: GlobalScalars,
    entries: Vec<UndoEntry>,
    /// `(now, amount)` read from the issuance source, consumed only on commit.
    issuance_mark: Option<(u64, Decimal)>,
}

impl Journal {
    pub fn begin(scalars: GlobalScalars) -> Self {
        Self {
            scalars,
            entries: Vec::new(),
            issuance_mark: None,
        }
    }

    pub fn record(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Whether issuance has already been folded into this operation.
    pub fn issuance_read(&self) -> bool {
        self.issuance_mark.is_some()
    }

    pub fn mark_issuance(&mut self, now: u64, amount: Decimal) {
        self.issuance_mark = Some((now, amount));
    }

    pub fn issuance_mark(&self) -> Option<(u64, Decimal)> {
        self.issuance_mark
    }

    /// Scalars as they were when the operation began.
    pub fn saved_scalars(&self) -> GlobalScalars {
        self.scalars
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Consume the journal, yielding entries newest first.
    pub fn into_undo_order(self) -> impl Iterator<Item = UndoEntry> {
        self.entries.into_iter().rev()
    }
}
