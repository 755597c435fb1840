//! # ballast-pool: Stability pool accounting.
//!
//! Depositors stake the stable asset; liquidation offsets cancel debt against
//! the pooled stake and hand the seized collateral to the pool. Each
//! depositor's compounded stake and gains are derived lazily from a snapshot
//! of the global accumulators, so every operation is O(1) in the number of
//! depositors.
//!
//! - **Running product `P`**: the fraction of a unit deposit that survives
//!   all offsets so far, re-scaled by `10^9` whenever it would lose precision
//!   and reset to `1.0` at the start of a new epoch.
//! - **Sum tables `S` and `G`**: cumulative collateral and reward token per
//!   unit staked, weighted by `P`, one cell per `(epoch, scale)`.
//! - **Front ends**: operators that forward a kickback fraction of reward
//!   token gains to the depositors tagged with them.
//!
//! Every public operation on [`PoolLedger`] is atomic: either it commits in
//! full or the ledger is rolled back from its undo journal.

pub mod accumulators;
pub mod compounding;
pub mod deposits;
pub mod front_end;
pub mod issuance;
pub mod journal;
pub mod ledger;
pub mod offset;
pub mod receipt;

pub use accumulators::{GlobalScalars, SumTable};
pub use ledger::PoolLedger;
pub use receipt::{FrontEndSettlement, OffsetOutcome, Settlement};
