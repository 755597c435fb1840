//! Compounding engine: pure functions over snapshots and accumulators.
//!
//! Nothing here touches ledger state. The ledger reads the accumulators,
//! calls into this module, and writes the results back through its journal.
//!
//! Scaling conventions (raw integers, `10^18 = 1.0`):
//!
//! | Quantity | Raw scale |
//! |----------|-----------|
//! | deposit, debt, collateral, `P`, per-unit values | `10^18` |
//! | `S`, `G` cells (`per_unit × P`) | `10^36` |

use ballast_core::constants::{DECIMAL_PRECISION, DUST_DIVISOR, SCALE_FACTOR};
use ballast_core::error::ArithmeticError;
use ballast_core::types::{EpochScale, Snapshot};
use ballast_core::Decimal;

use crate::accumulators::{GlobalScalars, SumTable};

/// Present value of a stake recorded as `initial` against `snapshot`.
///
/// Zero when the snapshot belongs to an earlier epoch, lies two or more
/// scales behind, or the result falls below `initial / 10^9`.
pub fn compounded_stake(
    initial: Decimal,
    snapshot: &Snapshot,
    current: &GlobalScalars,
) -> Result<Decimal, ArithmeticError> {
    if initial.is_zero() || snapshot.epoch < current.epoch {
        return Ok(Decimal::ZERO);
    }
    let scale_gap = current
        .scale
        .checked_sub(snapshot.scale)
        .ok_or(ArithmeticError::Underflow)?;

    let compounded = match scale_gap {
        0 => initial.mul_div(current.p, snapshot.p)?,
        1 => initial
            .mul_div(current.p, snapshot.p)?
            .checked_div_int(SCALE_FACTOR)?,
        _ => Decimal::ZERO,
    };

    if compounded < initial.checked_div_int(DUST_DIVISOR)? {
        return Ok(Decimal::ZERO);
    }
    Ok(compounded)
}

/// Gain accrued by `initial` since a snapshot of `(P₀, sum₀)` taken in `cell`.
///
/// Reads the snapshot's cell and, at a `10^9` discount, the next scale of the
/// same epoch; anything further has fallen below precision.
pub fn gain_from_snapshot(
    initial: Decimal,
    snapshot_p: Decimal,
    snapshot_sum: Decimal,
    cell: EpochScale,
    table: &SumTable,
) -> Result<Decimal, ArithmeticError> {
    if initial.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let first_portion = table.get(cell).checked_sub(snapshot_sum)?;
    let second_portion = table.get(cell.next_scale()).checked_div_int(SCALE_FACTOR)?;
    let delta = first_portion.checked_add(second_portion)?;

    initial
        .mul_div(delta, snapshot_p)?
        .checked_div_int(DECIMAL_PRECISION)
}

/// Per-unit values of one offset plus the rounding carries for the next one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OffsetPerUnit {
    pub gain_per_unit: Decimal,
    pub loss_per_unit: Decimal,
    pub collateral_error: Decimal,
    pub debt_loss_error: Decimal,
}

/// Collateral gain and debt loss per unit staked for an offset of `debt`
/// against `total` deposits.
///
/// `debt` must not exceed `total`. The loss is rounded up so that compounded
/// deposits never sum to more than the pool holds; the collateral gain is
/// rounded down so the pool never pays out more collateral than it received.
pub fn offset_per_unit(
    collateral: Decimal,
    debt: Decimal,
    total: Decimal,
    last_collateral_error: Decimal,
    last_debt_loss_error: Decimal,
) -> Result<OffsetPerUnit, ArithmeticError> {
    if total.is_zero() {
        return Err(ArithmeticError::DivisionByZero);
    }

    let collateral_numerator = collateral
        .checked_mul_int(DECIMAL_PRECISION)?
        .checked_add(last_collateral_error)?;
    let gain_per_unit = collateral_numerator.checked_div_raw(total)?;
    let collateral_error = collateral_numerator.checked_rem_raw(total)?;

    let (loss_per_unit, debt_loss_error) = if debt.is_zero() {
        (Decimal::ZERO, last_debt_loss_error)
    } else if debt == total {
        (Decimal::ONE, Decimal::ZERO)
    } else {
        let numerator = debt
            .checked_mul_int(DECIMAL_PRECISION)?
            .saturating_sub(last_debt_loss_error);
        let loss = numerator
            .checked_div_raw(total)?
            .checked_add(Decimal::from_raw(1u64))?
            .min(Decimal::ONE);
        let carry = loss.checked_mul_raw(total)?.saturating_sub(numerator);
        (loss, carry)
    };

    Ok(OffsetPerUnit {
        gain_per_unit,
        loss_per_unit,
        collateral_error,
        debt_loss_error,
    })
}

/// Reward token per unit staked for `issued` spread over `total`, and the new carry.
pub fn reward_per_unit(
    issued: Decimal,
    total: Decimal,
    last_reward_error: Decimal,
) -> Result<(Decimal, Decimal), ArithmeticError> {
    let numerator = issued
        .checked_mul_int(DECIMAL_PRECISION)?
        .checked_add(last_reward_error)?;
    let per_unit = numerator.checked_div_raw(total)?;
    let error = numerator.checked_rem_raw(total)?;
    Ok((per_unit, error))
}

/// What an offset did to the running product.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductOutcome {
    /// `P` shrank within the current scale.
    Compounded,
    /// `P` was multiplied by `10^9`; the scale advances.
    ScaleIncreased,
    /// The pool was emptied; a new epoch starts with `P = 1.0`.
    Depleted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProductStep {
    pub p: Decimal,
    pub outcome: ProductOutcome,
}

/// Apply a per-unit loss to the running product.
pub fn next_product(p: Decimal, loss_per_unit: Decimal) -> Result<ProductStep, ArithmeticError> {
    let factor = Decimal::ONE.saturating_sub(loss_per_unit);

    if factor.is_zero() {
        return Ok(ProductStep {
            p: Decimal::ONE,
            outcome: ProductOutcome::Depleted,
        });
    }

    let scaled = p.checked_mul_raw(factor)?;
    let candidate = scaled.checked_div_int(DECIMAL_PRECISION)?;
    let step = if candidate < Decimal::from_raw(SCALE_FACTOR) {
        ProductStep {
            p: scaled
                .checked_mul_int(SCALE_FACTOR)?
                .checked_div_int(DECIMAL_PRECISION)?,
            outcome: ProductOutcome::ScaleIncreased,
        }
    } else {
        ProductStep {
            p: candidate,
            outcome: ProductOutcome::Compounded,
        }
    };

    if step.p.is_zero() {
        return Err(ArithmeticError::Underflow);
    }
    Ok(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn units(n: u64) -> Decimal {
        Decimal::from_units(n)
    }

    fn raw(n: u128) -> Decimal {
        Decimal::from_raw(n)
    }

    fn scalars(p: Decimal, epoch: u64, scale: u64) -> GlobalScalars {
        GlobalScalars {
            p,
            epoch,
            scale,
            ..GlobalScalars::default()
        }
    }

    fn snapshot(p: Decimal, epoch: u64, scale: u64) -> Snapshot {
        Snapshot {
            p,
            epoch,
            scale,
            ..Snapshot::default()
        }
    }

    // --- compounded_stake ---

    #[test]
    fn same_scale_scales_by_product_ratio() {
        let snap = snapshot(Decimal::ONE, 0, 0);
        let now = scalars("0.9".parse().unwrap(), 0, 0);
        assert_eq!(compounded_stake(units(100), &snap, &now).unwrap(), units(90));
    }

    #[test]
    fn one_scale_gap_divides_by_scale_factor() {
        let snap = snapshot(raw(10_000_000_000), 0, 0);
        let now = scalars(raw(500_000_000_000_000_000), 0, 1);
        assert_eq!(compounded_stake(units(100), &snap, &now).unwrap(), units(5));
    }

    #[test]
    fn two_scale_gap_is_zero() {
        let snap = snapshot(Decimal::ONE, 0, 0);
        let now = scalars(Decimal::ONE, 0, 2);
        assert_eq!(compounded_stake(units(100), &snap, &now).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn earlier_epoch_is_zero() {
        let snap = snapshot(Decimal::ONE, 0, 0);
        let now = scalars(Decimal::ONE, 1, 0);
        assert_eq!(compounded_stake(units(100), &snap, &now).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn dust_reads_as_zero() {
        let snap = snapshot(Decimal::ONE, 0, 0);
        let now = scalars(raw(900_000_000), 0, 0);
        assert_eq!(compounded_stake(units(100), &snap, &now).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn zero_initial_short_circuits() {
        let now = scalars(Decimal::ONE, 0, 0);
        assert_eq!(
            compounded_stake(Decimal::ZERO, &Snapshot::default(), &now).unwrap(),
            Decimal::ZERO
        );
    }

    // --- gain_from_snapshot ---

    #[test]
    fn gain_reads_snapshot_cell() {
        // 10 collateral over 2000 staked at P = 1: 5e15 per unit, S = 5e33.
        let mut table = SumTable::new();
        let cell = EpochScale::new(0, 0);
        table.set(cell, raw(5_000_000_000_000_000).checked_mul_raw(Decimal::ONE).unwrap());
        let gain = gain_from_snapshot(units(1000), Decimal::ONE, Decimal::ZERO, cell, &table).unwrap();
        assert_eq!(gain, units(5));
    }

    #[test]
    fn gain_subtracts_snapshot_sum() {
        let mut table = SumTable::new();
        let cell = EpochScale::new(0, 0);
        let per_unit = raw(1_000_000_000_000_000);
        let s1 = per_unit.checked_mul_raw(Decimal::ONE).unwrap();
        table.set(cell, s1.checked_add(s1).unwrap());
        let gain = gain_from_snapshot(units(1000), Decimal::ONE, s1, cell, &table).unwrap();
        assert_eq!(gain, units(1));
    }

    #[test]
    fn gain_includes_discounted_next_scale() {
        let mut table = SumTable::new();
        let cell = EpochScale::new(0, 0);
        // One unit per unit staked, written after P was rescaled by 10^9.
        let next = Decimal::ONE.checked_mul_raw(Decimal::ONE).unwrap().checked_mul_int(SCALE_FACTOR).unwrap();
        table.set(cell.next_scale(), next);
        let gain = gain_from_snapshot(units(7), Decimal::ONE, Decimal::ZERO, cell, &table).unwrap();
        assert_eq!(gain, units(7));
    }

    #[test]
    fn gain_of_empty_stake_is_zero() {
        let table = SumTable::new();
        let gain = gain_from_snapshot(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, EpochScale::default(), &table);
        assert_eq!(gain.unwrap(), Decimal::ZERO);
    }

    // --- offset_per_unit ---

    #[test]
    fn partial_loss_rounds_up_and_carries() {
        let out = offset_per_unit(units(4), units(40), units(400), Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(out.gain_per_unit, raw(10_000_000_000_000_000));
        assert_eq!(out.collateral_error, Decimal::ZERO);
        assert_eq!(out.loss_per_unit, raw(100_000_000_000_000_001));
        assert_eq!(out.debt_loss_error, units(400));
    }

    #[test]
    fn full_loss_is_exactly_one() {
        let out = offset_per_unit(units(1), units(50), units(50), Decimal::ZERO, units(3)).unwrap();
        assert_eq!(out.loss_per_unit, Decimal::ONE);
        assert_eq!(out.debt_loss_error, Decimal::ZERO);
    }

    #[test]
    fn zero_debt_keeps_loss_carry() {
        let carry = raw(77);
        let out = offset_per_unit(units(1), Decimal::ZERO, units(50), Decimal::ZERO, carry).unwrap();
        assert_eq!(out.loss_per_unit, Decimal::ZERO);
        assert_eq!(out.debt_loss_error, carry);
    }

    #[test]
    fn collateral_remainder_is_carried() {
        // 1 raw collateral unit over 3 units staked.
        let out = offset_per_unit(raw(1), Decimal::ZERO, units(3), Decimal::ZERO, Decimal::ZERO).unwrap();
        assert_eq!(out.gain_per_unit, Decimal::ZERO);
        assert_eq!(out.collateral_error, Decimal::ONE);
    }

    #[test]
    fn empty_pool_cannot_offset() {
        assert_eq!(
            offset_per_unit(units(1), units(1), Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
            Err(ArithmeticError::DivisionByZero)
        );
    }

    // --- reward_per_unit ---

    #[test]
    fn reward_split_with_remainder() {
        let (per_unit, error) = reward_per_unit(units(1), units(3), Decimal::ZERO).unwrap();
        assert_eq!(per_unit, raw(333_333_333_333_333_333));
        assert_eq!(error, units(1));
    }

    // --- next_product ---

    #[test]
    fn half_loss_halves_product() {
        let step = next_product(Decimal::ONE, "0.5".parse().unwrap()).unwrap();
        assert_eq!(step.p, "0.5".parse().unwrap());
        assert_eq!(step.outcome, ProductOutcome::Compounded);
    }

    #[test]
    fn total_loss_resets_product() {
        let step = next_product(raw(123_456), Decimal::ONE).unwrap();
        assert_eq!(step.p, Decimal::ONE);
        assert_eq!(step.outcome, ProductOutcome::Depleted);
    }

    #[test]
    fn tiny_factor_increases_scale() {
        // factor 1e-10: P × factor = 1e8 raw < 1e9.
        let loss = Decimal::ONE.checked_sub(raw(100_000_000)).unwrap();
        let step = next_product(Decimal::ONE, loss).unwrap();
        assert_eq!(step.outcome, ProductOutcome::ScaleIncreased);
        assert_eq!(step.p, raw(100_000_000_000_000_000));
    }

    #[test]
    fn vanishing_product_is_an_underflow() {
        let loss = Decimal::ONE.checked_sub(raw(1)).unwrap();
        assert_eq!(next_product(raw(1), loss), Err(ArithmeticError::Underflow));
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn same_epoch_compounding_never_grows(
            initial in 1u128..1_000_000_000_000_000_000_000_000,
            p0 in 1_000_000_000u128..=1_000_000_000_000_000_000,
            shrink in 0u128..=1_000_000_000_000_000_000,
        ) {
            let p_now = Decimal::from_raw(p0).mul_div(raw(shrink), Decimal::ONE).unwrap();
            let snap = snapshot(raw(p0), 0, 0);
            let now = scalars(p_now, 0, 0);
            let value = compounded_stake(raw(initial), &snap, &now).unwrap();
            prop_assert!(value <= raw(initial));
        }

        #[test]
        fn product_stays_within_unit_interval(
            p in 1_000_000_000u128..=1_000_000_000_000_000_000,
            loss in 0u128..1_000_000_000_000_000_000,
        ) {
            let step = next_product(raw(p), raw(loss)).unwrap();
            prop_assert!(step.p <= Decimal::ONE);
            prop_assert!(step.p >= raw(SCALE_FACTOR) || step.outcome == ProductOutcome::ScaleIncreased);
        }

        #[test]
        fn loss_per_unit_covers_debt(
            total in 1u128..1_000_000_000_000_000_000_000_000,
            debt_ppm in 1u128..1_000_000,
        ) {
            let total_d = raw(total);
            let debt = total_d.mul_div(raw(debt_ppm), raw(1_000_000)).unwrap();
            prop_assume!(!debt.is_zero());
            let out = offset_per_unit(Decimal::ZERO, debt, total_d, Decimal::ZERO, Decimal::ZERO).unwrap();
            // loss × total ≥ debt × 10^18: deposits are never over-reported.
            let absorbed = out.loss_per_unit.checked_mul_raw(total_d).unwrap();
            prop_assert!(absorbed >= debt.checked_mul_int(DECIMAL_PRECISION).unwrap());
        }
    }
}
