//! The serialised service boundary around the pool ledger.
//!
//! [`PoolService`] holds the ledger and custody behind a
//! `parking_lot::ReentrantMutex<RefCell<_>>`. Callers on other threads queue
//! on the mutex; a call that re-enters the service on the thread already
//! inside it (e.g. from a custody callback during payout) finds the cell
//! borrowed and fails with [`PoolError::ReentrancyDetected`].
//!
//! Each state-changing call runs the ledger operation and the custody
//! `check` of its transfers as one journaled operation, then performs the
//! transfers after the ledger has committed.

use std::cell::RefCell;

use chrono::Utc;
use parking_lot::ReentrantMutex;
use tracing::{error, info, warn};

use ballast_core::traits::{Custody, IssuanceSource};
use ballast_core::types::{AccountId, Deposit, FrontEnd, FrontEndId, Transfer};
use ballast_core::{Decimal, PoolError};
use ballast_issuance::DecayingIssuance;
use ballast_pool::{OffsetOutcome, PoolLedger, Settlement};

use crate::config::PoolConfig;
use crate::custody::MemoryCustody;
use crate::error::{ConfigError, NodeError};
use crate::logging::init_logging;

/// A ledger receipt carrying transfers for custody.
trait Receipt {
    fn transfers(&self) -> &[Transfer];
}

impl Receipt for Settlement {
    fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }
}

impl Receipt for OffsetOutcome {
    fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }
}

struct ServiceState<I, C> {
    ledger: PoolLedger<I>,
    custody: C,
}

pub struct PoolService<I, C = MemoryCustody> {
    state: ReentrantMutex<RefCell<ServiceState<I, C>>>,
}

impl PoolService<DecayingIssuance, MemoryCustody> {
    /// Host entry point: install the tracing subscriber named by
    /// `config.log_level` / `config.log_format`, then build the service.
    ///
    /// Fails with [`NodeError::Logging`] if a global subscriber is already set.
    pub fn start(config: &PoolConfig) -> Result<Self, NodeError> {
        config.validate()?;
        init_logging(&config.log_level, &config.log_format)?;
        Self::from_config(config)
    }

    /// Build a service with the decaying issuance schedule and in-memory
    /// custody described by `config`, registering its front ends.
    ///
    /// The reward reserve is funded with the full supply cap.
    pub fn from_config(config: &PoolConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let issuance = DecayingIssuance::new(
            config.issuance.supply_cap,
            config.issuance.decay_factor_per_minute,
            config.issuance.deployment_time,
        )?;
        let mut ledger = PoolLedger::new(issuance, config.offset_authority_id());
        for fe in &config.front_ends {
            ledger.register_front_end(fe.operator_id(), fe.kickback)?;
        }

        let mut custody = MemoryCustody::new();
        custody
            .fund_rewards(config.issuance.supply_cap)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        info!(
            offset_authority = %ledger.offset_authority(),
            front_ends = config.front_ends.len(),
            supply_cap = %config.issuance.supply_cap,
            "pool service configured"
        );
        Ok(Self::new(ledger, custody))
    }
}

impl<I: IssuanceSource, C: Custody> PoolService<I, C> {
    pub fn new(ledger: PoolLedger<I>, custody: C) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(ServiceState { ledger, custody })),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut ServiceState<I, C>) -> Result<T, PoolError>) -> Result<T, PoolError> {
        let guard = self.state.lock();
        let mut state = guard.try_borrow_mut().map_err(|_| {
            warn!("reentrant call into pool service rejected");
            PoolError::ReentrancyDetected
        })?;
        f(&mut state)
    }

    fn read<T>(&self, f: impl FnOnce(&ServiceState<I, C>) -> Result<T, PoolError>) -> Result<T, PoolError> {
        let guard = self.state.lock();
        let state = guard.try_borrow().map_err(|_| PoolError::ReentrancyDetected)?;
        f(&state)
    }

    /// Run a ledger operation together with the custody check of its
    /// transfers, commit, then perform the transfers.
    fn transact<R: Receipt>(
        &self,
        op: impl FnOnce(&mut PoolLedger<I>) -> Result<R, PoolError>,
    ) -> Result<R, PoolError> {
        self.with_state(|state| {
            let ServiceState { ledger, custody } = state;
            let receipt = ledger.atomically(|ledger| {
                let receipt = op(ledger)?;
                custody.check(receipt.transfers())?;
                Ok(receipt)
            })?;
            if let Err(err) = custody.execute(receipt.transfers()) {
                error!(%err, "custody failed after a checked batch; ledger already committed");
                return Err(err.into());
            }
            Ok(receipt)
        })
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    pub fn provide(&self, depositor: AccountId, amount: Decimal, front_end: Option<FrontEndId>) -> Result<Settlement, PoolError> {
        self.provide_at(unix_now(), depositor, amount, front_end)
    }

    pub fn provide_at(
        &self,
        now: u64,
        depositor: AccountId,
        amount: Decimal,
        front_end: Option<FrontEndId>,
    ) -> Result<Settlement, PoolError> {
        self.transact(|ledger| ledger.provide(now, depositor, amount, front_end))
    }

    pub fn withdraw(&self, depositor: AccountId, amount: Decimal) -> Result<Settlement, PoolError> {
        self.withdraw_at(unix_now(), depositor, amount)
    }

    pub fn withdraw_at(&self, now: u64, depositor: AccountId, amount: Decimal) -> Result<Settlement, PoolError> {
        self.transact(|ledger| ledger.withdraw(now, depositor, amount))
    }

    pub fn offset(&self, caller: AccountId, debt: Decimal, collateral: Decimal) -> Result<OffsetOutcome, PoolError> {
        self.offset_at(unix_now(), caller, debt, collateral)
    }

    pub fn offset_at(
        &self,
        now: u64,
        caller: AccountId,
        debt: Decimal,
        collateral: Decimal,
    ) -> Result<OffsetOutcome, PoolError> {
        self.transact(|ledger| ledger.offset(now, caller, debt, collateral))
    }

    pub fn register_front_end(&self, operator: FrontEndId, kickback: Decimal) -> Result<FrontEnd, PoolError> {
        self.with_state(|state| state.ledger.register_front_end(operator, kickback))
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn compounded_deposit(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        self.read(|s| s.ledger.compounded_deposit(depositor))
    }

    pub fn depositor_collateral_gain(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        self.read(|s| s.ledger.depositor_collateral_gain(depositor))
    }

    pub fn depositor_reward_gain(&self, depositor: AccountId) -> Result<Decimal, PoolError> {
        self.read(|s| s.ledger.depositor_reward_gain(depositor))
    }

    pub fn compounded_front_end_stake(&self, id: FrontEndId) -> Result<Decimal, PoolError> {
        self.read(|s| s.ledger.compounded_front_end_stake(id))
    }

    pub fn front_end_reward_gain(&self, id: FrontEndId) -> Result<Decimal, PoolError> {
        self.read(|s| s.ledger.front_end_reward_gain(id))
    }

    pub fn total_deposits(&self) -> Result<Decimal, PoolError> {
        self.read(|s| Ok(s.ledger.total_deposits()))
    }

    pub fn collateral_balance(&self) -> Result<Decimal, PoolError> {
        self.read(|s| Ok(s.ledger.collateral_balance()))
    }

    pub fn current_epoch(&self) -> Result<u64, PoolError> {
        self.read(|s| Ok(s.ledger.current_epoch()))
    }

    pub fn current_scale(&self) -> Result<u64, PoolError> {
        self.read(|s| Ok(s.ledger.current_scale()))
    }

    pub fn p(&self) -> Result<Decimal, PoolError> {
        self.read(|s| Ok(s.ledger.p()))
    }

    pub fn deposit(&self, depositor: AccountId) -> Result<Option<Deposit>, PoolError> {
        self.read(|s| Ok(s.ledger.deposit(depositor).cloned()))
    }

    pub fn front_end(&self, id: FrontEndId) -> Result<Option<FrontEnd>, PoolError> {
        self.read(|s| Ok(s.ledger.front_end(id).cloned()))
    }

    /// Run `f` against the ledger for queries not delegated above.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&PoolLedger<I>) -> T) -> Result<T, PoolError> {
        self.read(|s| Ok(f(&s.ledger)))
    }

    pub fn with_custody<T>(&self, f: impl FnOnce(&C) -> T) -> Result<T, PoolError> {
        self.read(|s| Ok(f(&s.custody)))
    }

    /// Mutable custody access for funding accounts outside pool operations.
    pub fn with_custody_mut<T>(&self, f: impl FnOnce(&mut C) -> T) -> Result<T, PoolError> {
        self.with_state(|s| Ok(f(&mut s.custody)))
    }

    pub fn with_issuance_mut<T>(&self, f: impl FnOnce(&mut I) -> T) -> Result<T, PoolError> {
        self.with_state(|s| Ok(f(s.ledger.issuance_mut()?)))
    }
}

/// Host clock in unix seconds.
fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
