//! The pool ledger: accumulators, records and the operation boundary.
//!
//! [`PoolLedger`] owns all pool state plus the issuance source. State-changing
//! operations live in sibling modules (`deposits`, `offset`, `front_end`) and
//! all run inside [`PoolLedger::atomically`], which journals every write and
//! restores the prior state if the operation fails.
//!
//! Not thread-safe; the host serialises access (see `ballast-node`).

use std::collections::HashMap;

use tracing::debug;

use ballast_core::error::ArithmeticError;
use ballast_core::traits::IssuanceSource;
use ballast_core::types::{AccountId, Deposit, EpochScale, FrontEnd, FrontEndId, Snapshot};
use ballast_core::{Decimal, PoolError};

use crate::accumulators::{GlobalScalars, SumTable};
use crate::compounding::{compounded_stake, gain_from_snapshot};
use crate::journal::{Journal, UndoEntry};

#[derive(Debug)]
pub struct PoolLedger<I> {
    pub(crate) scalars: GlobalScalars,
    /// `S`: collateral per unit staked, weighted by `P`.
    pub(crate) collateral_sums: SumTable,
    /// `G`: reward token per unit staked, weighted by `P`.
    pub(crate) reward_sums: SumTable,
    pub(crate) deposits: HashMap<AccountId, Deposit>,
    pub(crate) front_ends: HashMap<FrontEndId, FrontEnd>,
    pub(crate) issuance: I,
    offset_authority: AccountId,
    pub(crate) journal: Option<Journal>,
}

impl<I: IssuanceSource> PoolLedger<I> {
    /// An empty pool. Only `offset_authority` may call [`offset`](Self::offset).
    pub fn new(issuance: I, offset_authority: AccountId) -> Self {
        Self {
            scalars: GlobalScalars::default(),
            collateral_sums: SumTable::new(),
            reward_sums: SumTable::new(),
            deposits: HashMap::new(),
            front_ends: HashMap::new(),
            issuance,
            offset_authority,
            journal: None,
        }
    }

    /// Run `f` as one all-or-nothing operation.
    ///
    /// On error every write made by `f` is undone and the issuance source is
    /// left unconsumed. Nested calls join the outermost operation, so a host
    /// can wrap a ledger operation together with its own checks.
    pub fn atomically<T, F>(&mut self, f: F) -> Result<T, PoolError>
    where
        F: FnOnce(&mut Self) -> Result<T, PoolError>,
    {
        if self.journal.is_some() {
            return f(self);
        }

        self.journal = Some(Journal::begin(self.scalars));
        let result = f(self);
        let Some(journal) = self.journal.take() else {
            return result;
        };

        match result {
            Ok(value) => {
                if let Some((now, amount)) = journal.issuance_mark() {
                    if !amount.is_zero() {
                        self.issuance.mark_issued(now, amount);
                    }
                }
                Ok(value)
            }
            Err(err) => {
                let undone = journal.len();
                self.rollback(journal);
                debug!(%err, undone, "ledger: operation rolled back");
                Err(err)
            }
        }
    }

    fn rollback(&mut self, journal: Journal) {
        self.scalars = journal.saved_scalars();
        for entry in journal.into_undo_order() {
            match entry {
                UndoEntry::CollateralSum(cell, prev) => self.collateral_sums.restore(cell, prev),
                UndoEntry::RewardSum(cell, prev) => self.reward_sums.restore(cell, prev),
                UndoEntry::Deposit(owner, prev) => match prev {
                    Some(deposit) => {
                        self.deposits.insert(owner, deposit);
                    }
                    None => {
                        self.deposits.remove(&owner);
                    }
                },
                UndoEntry::FrontEnd(id, prev) => match prev {
                    Some(front_end) => {
                        self.front_ends.insert(id, front_end);
                    }
                    None => {
                        self.front_ends.remove(&id);
                    }
                },
            }
        }
    }

    // ------------------------------------------------------------------
    // Journaled writes
    // ------------------------------------------------------------------

    fn record(&mut self, entry: UndoEntry) {
        if let Some(journal) = self.journal.as_mut() {
            journal.record(entry);
        }
    }

    pub(crate) fn add_collateral_sum(&mut self, cell: EpochScale, delta: Decimal) -> Result<Decimal, ArithmeticError> {
        let (prev, updated) = self.collateral_sums.add(cell, delta)?;
        self.record(UndoEntry::CollateralSum(cell, prev));
        Ok(updated)
    }

    pub(crate) fn add_reward_sum(&mut self, cell: EpochScale, delta: Decimal) -> Result<Decimal, ArithmeticError> {
        let (prev, updated) = self.reward_sums.add(cell, delta)?;
        self.record(UndoEntry::RewardSum(cell, prev));
        Ok(updated)
    }

    /// Store a deposit record, or remove it when `deposit` is `None`.
    pub(crate) fn put_deposit(&mut self, owner: AccountId, deposit: Option<Deposit>) {
        let prev = match deposit {
            Some(d) => self.deposits.insert(owner, d),
            None => self.deposits.remove(&owner),
        };
        self.record(UndoEntry::Deposit(owner, prev));
    }

    pub(crate) fn put_front_end(&mut self, front_end: FrontEnd) {
        let id = front_end.id;
        let prev = self.front_ends.insert(id, front_end);
        self.record(UndoEntry::FrontEnd(id, prev));
    }

    /// Accumulators of the current cell, as a depositor snapshot.
    pub(crate) fn depositor_snapshot(&self) -> Snapshot {
        let cell = self.scalars.cell();
        Snapshot {
            p: self.scalars.p,
            s: self.collateral_sums.get(cell),
            g: self.reward_sums.get(cell),
            epoch: cell.epoch,
            scale: cell.scale,
        }
    }

    /// Like [`depositor_snapshot`](Self::depositor_snapshot) without `S`.
    pub(crate) fn front_end_snapshot(&self) -> Snapshot {
        Snapshot {
            s: Decimal::ZERO,
            ..self.depositor_snapshot()
        }
    }

    // ------------------------------------------------------------------
    // Depositor queries
    // ------------------------------------------------------------------

    /// Current value of a deposit after all offsets since its last interaction.
    pub fn compounded_deposit(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        match self.deposits.get(&depositor) {
            Some(d) => Ok(compounded_stake(d.initial_value, &d.snapshot, &self.scalars)?),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Collateral accrued by a deposit and not yet paid out.
    pub fn depositor_collateral_gain(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        match self.deposits.get(&depositor) {
            Some(d) => Ok(gain_from_snapshot(
                d.initial_value,
                d.snapshot.p,
                d.snapshot.s,
                d.snapshot.cell(),
                &self.collateral_sums,
            )?),
            None => Ok(Decimal::ZERO),
        }
    }

    /// Reward token accrued by a deposit, after its front end's kickback.
    pub fn depositor_reward_gain(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        let Some(d) = self.deposits.get(&depositor) else {
            return Ok(Decimal::ZERO);
        };
        let raw_gain = gain_from_snapshot(
            d.initial_value,
            d.snapshot.p,
            d.snapshot.g,
            d.snapshot.cell(),
            &self.reward_sums,
        )?;
        Ok(raw_gain.decimal_mul(self.kickback_of(d.front_end))?)
    }

    // ------------------------------------------------------------------
    // Global queries
    // ------------------------------------------------------------------

    pub fn total_deposits(&self) -> Decimal {
        self.scalars.total_deposits
    }

    pub fn collateral_balance(&self) -> Decimal {
        self.scalars.collateral_balance
    }

    pub fn current_epoch(&self) -> u64 {
        self.scalars.epoch
    }

    pub fn current_scale(&self) -> u64 {
        self.scalars.scale
    }

    /// The running product `P`.
    pub fn p(&self) -> Decimal {
        self.scalars.p
    }

    pub fn scalars(&self) -> GlobalScalars {
        self.scalars
    }

    pub fn collateral_sum_at(&self, epoch: u64, scale: u64) -> Decimal {
        self.collateral_sums.get(EpochScale::new(epoch, scale))
    }

    pub fn reward_sum_at(&self, epoch: u64, scale: u64) -> Decimal {
        self.reward_sums.get(EpochScale::new(epoch, scale))
    }

    pub fn deposit(&self, depositor: AccountId) -> Option<&Deposit> {
        self.deposits.get(&depositor)
    }

    pub fn front_end(&self, id: FrontEndId) -> Option<&FrontEnd> {
        self.front_ends.get(&id)
    }

    /// Number of open deposits.
    pub fn depositor_count(&self) -> usize {
        self.deposits.len()
    }

    pub fn offset_authority(&self) -> AccountId {
        self.offset_authority
    }

    pub fn issuance(&self) -> &I {
        &self.issuance
    }

    /// Mutable access to the issuance source between operations.
    ///
    /// # Errors
    ///
    /// [`PoolError::PreconditionViolated`] while an operation is in flight.
    pub fn issuance_mut(&mut self) -> Result<&mut I, PoolError> {
        if self.journal.is_some() {
            return Err(PoolError::PreconditionViolated(
                "issuance source is locked by an operation".into(),
            ));
        }
        Ok(&mut self.issuance)
    }

    /// Whether an operation is in flight.
    pub fn in_operation(&self) -> bool {
        self.journal.is_some()
    }
}
