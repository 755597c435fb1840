//! Decaying issuance source implementing [`IssuanceSource`].
//!
//! Cumulative issuance at time `t` is `supply_cap × (1 - f^minutes(t))`.
//! The pool consumes the difference between that and what it has already
//! marked issued.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ballast_core::constants::{DECIMAL_PRECISION, DEFAULT_ISSUANCE_FACTOR_RAW, DEFAULT_ISSUANCE_SUPPLY_CAP};
use ballast_core::error::{ArithmeticError, IssuanceError};
use ballast_core::traits::IssuanceSource;
use ballast_core::Decimal;

use crate::curve::{cumulative_fraction, elapsed_minutes};

/// The production issuance schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayingIssuance {
    supply_cap: Decimal,
    /// Per-minute retention factor, `< 1`.
    factor: Decimal,
    /// Unix seconds at which issuance starts.
    deployment_time: u64,
    total_issued: Decimal,
}

impl DecayingIssuance {
    /// Create a schedule. Fails if `factor` exceeds `1.0`.
    pub fn new(supply_cap: Decimal, factor: Decimal, deployment_time: u64) -> Result<Self, IssuanceError> {
        if factor > Decimal::ONE {
            return Err(IssuanceError::InvalidFactor(factor));
        }
        Ok(Self {
            supply_cap,
            factor,
            deployment_time,
            total_issued: Decimal::ZERO,
        })
    }

    /// Default cap (32M tokens) and factor (halving yearly) starting at `deployment_time`.
    pub fn with_defaults(deployment_time: u64) -> Self {
        Self {
            supply_cap: Decimal::from_units(DEFAULT_ISSUANCE_SUPPLY_CAP),
            factor: Decimal::from_raw(DEFAULT_ISSUANCE_FACTOR_RAW),
            deployment_time,
            total_issued: Decimal::ZERO,
        }
    }

    pub fn supply_cap(&self) -> Decimal {
        self.supply_cap
    }

    pub fn deployment_time(&self) -> u64 {
        self.deployment_time
    }

    /// Cumulative amount the schedule allows by `now`, issued or not.
    ///
    /// Zero until `deployment_time`, so a host clock running behind the
    /// schedule never blocks pool operations.
    pub fn cumulative_at(&self, now: u64) -> Result<Decimal, IssuanceError> {
        if now < self.deployment_time {
            return Ok(Decimal::ZERO);
        }
        let minutes = elapsed_minutes(self.deployment_time, now)?;
        // factor <= 1.0 is enforced at construction, so the raw value fits u128.
        let factor_raw =
            u128::try_from(self.factor.raw()).map_err(|_| ArithmeticError::Overflow)?;
        let fraction = cumulative_fraction(factor_raw, minutes)?;
        let cumulative = self
            .supply_cap
            .mul_div(Decimal::from_raw(fraction), Decimal::from_raw(DECIMAL_PRECISION))?;
        Ok(cumulative)
    }
}

impl IssuanceSource for DecayingIssuance {
    fn issuable(&self, now: u64) -> Result<Decimal, IssuanceError> {
        Ok(self.cumulative_at(now)?.saturating_sub(self.total_issued))
    }

    fn mark_issued(&mut self, now: u64, amount: Decimal) {
        let total = match self.total_issued.checked_add(amount) {
            Ok(total) if total <= self.supply_cap => total,
            _ => {
                warn!(now, %amount, total_issued = %self.total_issued, cap = %self.supply_cap, "issuance: mark exceeds supply cap, clamping");
                self.supply_cap
            }
        };
        self.total_issued = total;
        debug!(now, %amount, total_issued = %total, "issuance: marked issued");
    }

    fn total_issued(&self) -> Decimal {
        self.total_issued
    }
}
