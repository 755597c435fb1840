//! In-memory custody of the stable asset, collateral and reward token.
//!
//! Balances are held per account and per pool reserve. A transfer batch is
//! first simulated against a small overlay of the touched balances; only a
//! batch that simulates cleanly is applied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ballast_core::error::CustodyError;
use ballast_core::traits::Custody;
use ballast_core::types::{AccountId, Transfer};
use ballast_core::Decimal;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Asset {
    /// The stable asset depositors stake.
    Deposit,
    Collateral,
    Reward,
}

impl Asset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Collateral => "collateral",
            Self::Reward => "reward",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Slot {
    Account(Asset, AccountId),
    Pool(Asset),
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCustody {
    balances: HashMap<Slot, Decimal>,
    burned: Decimal,
}

impl MemoryCustody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to an account out of thin air.
    pub fn mint(&mut self, account: AccountId, asset: Asset, amount: Decimal) -> Result<(), CustodyError> {
        let slot = Slot::Account(asset, account);
        let updated = self.read(slot).checked_add(amount)?;
        self.balances.insert(slot, updated);
        Ok(())
    }

    /// Top up the reserve reward token is paid from.
    pub fn fund_rewards(&mut self, amount: Decimal) -> Result<(), CustodyError> {
        let slot = Slot::Pool(Asset::Reward);
        let updated = self.read(slot).checked_add(amount)?;
        self.balances.insert(slot, updated);
        Ok(())
    }

    pub fn balance(&self, account: AccountId, asset: Asset) -> Decimal {
        self.read(Slot::Account(asset, account))
    }

    pub fn pool_balance(&self, asset: Asset) -> Decimal {
        self.read(Slot::Pool(asset))
    }

    /// Stable asset destroyed by offsets so far.
    pub fn burned(&self) -> Decimal {
        self.burned
    }

    fn read(&self, slot: Slot) -> Decimal {
        self.balances.get(&slot).copied().unwrap_or(Decimal::ZERO)
    }

    /// Balances of every touched slot after `transfers`, plus the burned total.
    fn simulate(&self, transfers: &[Transfer]) -> Result<(HashMap<Slot, Decimal>, Decimal), CustodyError> {
        let mut overlay: HashMap<Slot, Decimal> = HashMap::new();
        let mut burned = self.burned;

        for transfer in transfers {
            let (from, to, asset) = route(transfer);
            let amount = transfer.amount();

            let have = overlay.get(&from).copied().unwrap_or_else(|| self.read(from));
            let remaining = have.checked_sub(amount).map_err(|_| match from {
                Slot::Account(asset, account) => CustodyError::InsufficientFunds {
                    account: account.to_string(),
                    asset: asset.name(),
                    have,
                    need: amount,
                },
                Slot::Pool(asset) => CustodyError::InsufficientReserve {
                    asset: asset.name(),
                    have,
                    need: amount,
                },
            })?;
            overlay.insert(from, remaining);

            match to {
                Some(to) => {
                    let current = overlay.get(&to).copied().unwrap_or_else(|| self.read(to));
                    overlay.insert(to, current.checked_add(amount)?);
                }
                None => {
                    debug_assert_eq!(asset, Asset::Deposit);
                    burned = burned.checked_add(amount)?;
                }
            }
        }
        Ok((overlay, burned))
    }
}

/// Source slot, destination slot (`None` burns) and asset of a transfer.
fn route(transfer: &Transfer) -> (Slot, Option<Slot>, Asset) {
    match *transfer {
        Transfer::PullDeposit { from, .. } => (
            Slot::Account(Asset::Deposit, from),
            Some(Slot::Pool(Asset::Deposit)),
            Asset::Deposit,
        ),
        Transfer::ReleaseDeposit { to, .. } => (
            Slot::Pool(Asset::Deposit),
            Some(Slot::Account(Asset::Deposit, to)),
            Asset::Deposit,
        ),
        Transfer::BurnDeposit { .. } => (Slot::Pool(Asset::Deposit), None, Asset::Deposit),
        Transfer::AcceptCollateral { from, .. } => (
            Slot::Account(Asset::Collateral, from),
            Some(Slot::Pool(Asset::Collateral)),
            Asset::Collateral,
        ),
        Transfer::PayCollateral { to, .. } => (
            Slot::Pool(Asset::Collateral),
            Some(Slot::Account(Asset::Collateral, to)),
            Asset::Collateral,
        ),
        Transfer::PayReward { to, .. } => (
            Slot::Pool(Asset::Reward),
            Some(Slot::Account(Asset::Reward, to)),
            Asset::Reward,
        ),
    }
}

impl Custody for MemoryCustody {
    fn check(&self, transfers: &[Transfer]) -> Result<(), CustodyError> {
        self.simulate(transfers).map(|_| ())
    }

    fn execute(&mut self, transfers: &[Transfer]) -> Result<(), CustodyError> {
        let (overlay, burned) = self.simulate(transfers)?;
        self.balances.extend(overlay);
        self.burned = burned;
        debug!(count = transfers.len(), "custody: transfers executed");
        Ok(())
    }
}
