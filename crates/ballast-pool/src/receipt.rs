//! Receipts returned by committed ledger operations.
//!
//! A receipt lists the [`Transfer`]s the host must perform; the ledger
//! itself never moves tokens.

use serde::{Deserialize, Serialize};

use ballast_core::types::{AccountId, FrontEndId, Transfer};
use ballast_core::Decimal;

/// Outcome of `provide` or `withdraw` for one depositor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub depositor: AccountId,
    /// Compounded balance before this operation's amount was applied.
    pub compounded_before: Decimal,
    /// Principal absorbed by offsets since the last interaction.
    pub deposit_loss: Decimal,
    pub new_deposit: Decimal,
    pub collateral_gain: Decimal,
    /// Depositor's share of the reward token, after kickback.
    pub reward_gain: Decimal,
    pub front_end: Option<FrontEndSettlement>,
    pub transfers: Vec<Transfer>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FrontEndSettlement {
    pub id: FrontEndId,
    pub reward_gain: Decimal,
    pub new_stake: Decimal,
}

/// Outcome of one liquidation offset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OffsetOutcome {
    /// Debt cancelled, after clamping to the pool's total deposits.
    pub debt_absorbed: Decimal,
    pub collateral_added: Decimal,
    pub loss_per_unit: Decimal,
    pub gain_per_unit: Decimal,
    /// Epoch and scale after the offset.
    pub epoch: u64,
    pub scale: u64,
    pub depleted: bool,
    pub scale_changed: bool,
    pub transfers: Vec<Transfer>,
}

impl Settlement {
    /// Sum of reward token paid out by this settlement, front end included.
    pub fn total_reward_paid(&self) -> Decimal {
        let front_end = self
            .front_end
            .as_ref()
            .map_or(Decimal::ZERO, |fe| fe.reward_gain);
        self.reward_gain.checked_add(front_end).unwrap_or(self.reward_gain)
    }
}
