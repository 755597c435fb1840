//! Core pool records: identities, snapshots, deposits, front ends and transfers.
//!
//! All amounts are [`Decimal`]s (18 decimals).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::Decimal;

/// A 32-byte account identity.
///
/// Depositors, front-end operators and the offset authority are all accounts.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; 32]);

/// Front-end operators are ordinary accounts that registered a kickback rate.
pub type FrontEndId = AccountId;

impl AccountId {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Deterministic id derived from a human-readable label (BLAKE3).
    pub fn from_label(label: &str) -> Self {
        Self(*blake3::hash(label.as_bytes()).as_bytes())
    }

    /// Parse a 64-character hex id.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let array: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Key of one cell in the epoch/scale sum tables.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EpochScale {
    pub epoch: u64,
    pub scale: u64,
}

impl EpochScale {
    pub fn new(epoch: u64, scale: u64) -> Self {
        Self { epoch, scale }
    }

    /// The next scale within the same epoch.
    pub fn next_scale(&self) -> Self {
        Self {
            epoch: self.epoch,
            scale: self.scale.saturating_add(1),
        }
    }
}

impl fmt::Display for EpochScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.epoch, self.scale)
    }
}

/// Copy of the global accumulators taken at a depositor's last interaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Snapshot {
    /// Running product `P`.
    pub p: Decimal,
    /// Collateral sum `S` of the snapshot's cell. Always zero for front ends.
    pub s: Decimal,
    /// Reward sum `G` of the snapshot's cell.
    pub g: Decimal,
    pub epoch: u64,
    pub scale: u64,
}

impl Snapshot {
    pub fn cell(&self) -> EpochScale {
        EpochScale::new(self.epoch, self.scale)
    }
}

/// A depositor's stake.
///
/// `initial_value` is the balance at the last interaction; the present value
/// is derived from it and the snapshot on demand.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Deposit {
    pub owner: AccountId,
    pub initial_value: Decimal,
    /// Front end the deposit was opened through. Fixed until the deposit returns to zero.
    pub front_end: Option<FrontEndId>,
    pub snapshot: Snapshot,
}

impl Deposit {
    /// An emptied deposit: zero value, no tag, zero snapshot.
    pub fn empty(owner: AccountId) -> Self {
        Self {
            owner,
            initial_value: Decimal::ZERO,
            front_end: None,
            snapshot: Snapshot::default(),
        }
    }
}

/// A registered front-end operator and the aggregate stake routed through it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FrontEnd {
    pub id: FrontEndId,
    /// Fraction of reward-token gains forwarded to tagged depositors, in `[0, 1]`.
    pub kickback: Decimal,
    pub stake: Decimal,
    pub snapshot: Snapshot,
}

/// One movement of value performed by the custody collaborator after an operation commits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Transfer {
    /// Stable asset from a depositor into pool custody.
    PullDeposit { from: AccountId, amount: Decimal },
    /// Stable asset from pool custody back to a depositor.
    ReleaseDeposit { to: AccountId, amount: Decimal },
    /// Stable asset destroyed to cancel offset debt.
    BurnDeposit { amount: Decimal },
    /// Seized collateral handed to the pool by the offset authority.
    AcceptCollateral { from: AccountId, amount: Decimal },
    /// Collateral gain paid to a depositor.
    PayCollateral { to: AccountId, amount: Decimal },
    /// Reward-token gain paid to a depositor or front end.
    PayReward { to: AccountId, amount: Decimal },
}

impl Transfer {
    pub fn amount(&self) -> Decimal {
        match self {
            Self::PullDeposit { amount, .. }
            | Self::ReleaseDeposit { amount, .. }
            | Self::BurnDeposit { amount }
            | Self::AcceptCollateral { amount, .. }
            | Self::PayCollateral { amount, .. }
            | Self::PayReward { amount, .. } => *amount,
        }
    }
}
