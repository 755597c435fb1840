//! End-to-end accounting scenarios for the pool ledger.
//!
//! Each test drives a fresh ledger through a short sequence of deposits,
//! offsets, issuance and withdrawals, then checks balances and gains
//! against hand-computed values. Tolerances are in raw units (10^-18).

use ballast_core::traits::IssuanceSource;
use ballast_core::types::Transfer;
use ballast_core::{Decimal, PoolError};
use ballast_issuance::DecayingIssuance;
use ballast_pool::PoolLedger;
use ballast_tests::helpers::*;

// ---------------------------------------------------------------------------
// Two-event walkthrough
// ---------------------------------------------------------------------------

#[test]
fn two_offsets_across_an_epoch_boundary() {
    let mut l = ledger_with(&[("a", 1000), ("b", 1000)]);
    let (a, b) = (account("a"), account("b"));

    let first = l.offset(0, authority(), units(1000), units(10)).unwrap();
    assert!(!first.depleted);
    assert_eq!(l.total_deposits(), units(1000));

    // Rounding the loss up costs each depositor 1000 raw units.
    assert_close(l.compounded_deposit(a).unwrap(), units(500), 1000);
    assert!(l.compounded_deposit(a).unwrap() <= units(500));
    assert_eq!(l.depositor_collateral_gain(a).unwrap(), units(5));
    assert_eq!(l.depositor_collateral_gain(b).unwrap(), units(5));

    // A claims between the events; B does not.
    let claim = l.withdraw(0, a, Decimal::ZERO).unwrap();
    assert_eq!(claim.collateral_gain, units(5));

    let second = l.offset(0, authority(), units(1000), units(20)).unwrap();
    assert!(second.depleted);
    assert_eq!(l.current_epoch(), 1);
    assert_eq!(l.current_scale(), 0);
    assert_eq!(l.p(), Decimal::ONE);
    assert_eq!(l.total_deposits(), Decimal::ZERO);

    assert_eq!(l.compounded_deposit(a).unwrap(), Decimal::ZERO);
    assert_eq!(l.compounded_deposit(b).unwrap(), Decimal::ZERO);

    // Depositors of the depleting event's epoch still collect its collateral.
    let a_gain = l.depositor_collateral_gain(a).unwrap();
    let b_gain = l.depositor_collateral_gain(b).unwrap();
    assert_close(a_gain, units(10), 20);
    assert_close(b_gain, units(15), 20);

    let total_paid = units(5).checked_add(a_gain).unwrap().checked_add(b_gain).unwrap();
    assert!(total_paid <= units(30));
    assert!(l.collateral_balance() >= a_gain.checked_add(b_gain).unwrap());

    // Closing out pays the collateral and withdraws nothing.
    let out = l.withdraw(0, b, units(1000)).unwrap();
    assert_eq!(out.new_deposit, Decimal::ZERO);
    assert_eq!(out.collateral_gain, b_gain);
    assert!(out.transfers.iter().all(|t| !matches!(t, Transfer::ReleaseDeposit { .. })));
    assert!(l.deposit(b).is_none());
}

// ---------------------------------------------------------------------------
// Proportional absorption
// ---------------------------------------------------------------------------

#[test]
fn losses_and_collateral_split_pro_rata() {
    let mut l = ledger_with(&[("small", 100), ("large", 300)]);
    l.offset(0, authority(), units(40), units(4)).unwrap();

    let small = l.compounded_deposit(account("small")).unwrap();
    let large = l.compounded_deposit(account("large")).unwrap();
    assert_close(small, units(90), 100);
    assert_close(large, units(270), 300);

    assert_eq!(l.depositor_collateral_gain(account("small")).unwrap(), units(1));
    assert_eq!(l.depositor_collateral_gain(account("large")).unwrap(), units(3));
}

#[test]
fn compounded_deposits_never_exceed_total() {
    let mut l = ledger_with(&[("a", 100), ("b", 300), ("c", 7)]);
    for (debt, coll) in [(40, 4), (33, 1), (100, 9)] {
        l.offset(0, authority(), units(debt), units(coll)).unwrap();
    }
    let sum = ["a", "b", "c"]
        .iter()
        .map(|who| l.compounded_deposit(account(who)).unwrap())
        .fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap());
    assert!(sum <= l.total_deposits());
    assert_close(sum, l.total_deposits(), 10_000);
}

#[test]
fn late_depositor_takes_no_earlier_loss() {
    let mut l = ledger_with(&[("early", 100)]);
    l.offset(0, authority(), units(50), units(5)).unwrap();
    l.provide(0, account("late"), units(50), None).unwrap();

    assert_eq!(l.compounded_deposit(account("late")).unwrap(), units(50));
    assert_eq!(l.depositor_collateral_gain(account("late")).unwrap(), Decimal::ZERO);

    // The next offset splits evenly between two ~50 stakes.
    l.offset(0, authority(), units(10), units(2)).unwrap();
    assert_close(l.compounded_deposit(account("late")).unwrap(), units(45), 100);
    assert_close(l.compounded_deposit(account("early")).unwrap(), units(45), 200);
    assert_close(l.depositor_collateral_gain(account("late")).unwrap(), units(1), 100);
    assert_close(l.depositor_collateral_gain(account("early")).unwrap(), units(6), 100);
}

// ---------------------------------------------------------------------------
// Depletion, epochs and scales
// ---------------------------------------------------------------------------

#[test]
fn depletion_zeroes_every_deposit_without_touching_records() {
    let mut l = ledger_with(&[("a", 10), ("b", 20), ("c", 30)]);
    let before: Vec<_> = ["a", "b", "c"].iter().map(|w| l.deposit(account(w)).cloned()).collect();

    l.offset(0, authority(), units(60), units(6)).unwrap();

    let after: Vec<_> = ["a", "b", "c"].iter().map(|w| l.deposit(account(w)).cloned()).collect();
    assert_eq!(before, after);
    for who in ["a", "b", "c"] {
        assert_eq!(l.compounded_deposit(account(who)).unwrap(), Decimal::ZERO);
    }
    assert_eq!(l.depositor_collateral_gain(account("c")).unwrap(), units(3));

    // A fresh deposit in the new epoch starts whole.
    l.provide(0, account("d"), units(5), None).unwrap();
    assert_eq!(l.compounded_deposit(account("d")).unwrap(), units(5));
    assert_eq!(l.total_deposits(), units(5));
}

#[test]
fn scale_change_then_depletion_resets_product() {
    let mut l = ledger_with(&[("whale", 1_000_000_000)]);
    let debt = units(1_000_000_000).checked_sub(dec("0.1")).unwrap();
    let out = l.offset(0, authority(), debt, Decimal::ZERO).unwrap();
    assert!(out.scale_changed);
    assert_eq!((l.current_epoch(), l.current_scale()), (0, 1));
    assert!(l.p() < Decimal::ONE);

    // The whale is left with ~0.1, below the dust floor of 1.0.
    assert_eq!(l.compounded_deposit(account("whale")).unwrap(), Decimal::ZERO);

    l.provide(0, account("minnow"), units(1), None).unwrap();
    assert_eq!(l.compounded_deposit(account("minnow")).unwrap(), units(1));

    let total = l.total_deposits();
    l.offset(0, authority(), total, units(1)).unwrap();
    assert_eq!((l.current_epoch(), l.current_scale()), (1, 0));
    assert_eq!(l.p(), Decimal::ONE);
}

#[test]
fn deposit_survives_a_scale_change_with_its_gains() {
    // Shrink P to ~1e-8 without leaving the first scale.
    let mut l = ledger_with(&[("whale", 1_000_000_000)]);
    l.offset(0, authority(), units(999_999_990), Decimal::ZERO).unwrap();
    assert_eq!(l.current_scale(), 0);
    assert_eq!(l.total_deposits(), units(10));

    let a = account("a");
    l.provide(0, a, units(90), None).unwrap();

    // A 95% loss pushes P below the rescale threshold.
    let out = l.offset(0, authority(), units(95), units(20)).unwrap();
    assert!(out.scale_changed);
    assert_eq!((l.current_epoch(), l.current_scale()), (0, 1));
    assert_close(l.compounded_deposit(a).unwrap(), dec("4.5"), 100_000_000_000);
    assert_close(l.depositor_collateral_gain(a).unwrap(), units(18), 1_000);

    // Collateral landing in the new scale still reaches the old snapshot.
    l.offset(0, authority(), Decimal::ZERO, units(10)).unwrap();
    assert_close(l.depositor_collateral_gain(a).unwrap(), units(27), 100_000_000_000);
}

// ---------------------------------------------------------------------------
// Reward token and front ends
// ---------------------------------------------------------------------------

#[test]
fn kickback_splits_reward_between_depositor_and_front_end() {
    let mut l = ledger();
    let fe = account("frontend");
    l.register_front_end(fe, dec("0.5")).unwrap();
    l.provide(0, account("a"), units(100), Some(fe)).unwrap();

    l.issuance_mut().unwrap().grant(units(100)).unwrap();
    let s = l.withdraw(60, account("a"), Decimal::ZERO).unwrap();

    assert_eq!(s.reward_gain, units(50));
    assert_eq!(s.front_end.as_ref().unwrap().reward_gain, units(50));
    assert_eq!(s.total_reward_paid(), units(100));
    assert_eq!(l.front_end_reward_gain(fe).unwrap(), Decimal::ZERO);
}

#[test]
fn front_end_stake_tracks_tagged_deposits_through_losses() {
    let mut l = ledger();
    let fe = account("frontend");
    l.register_front_end(fe, dec("0.8")).unwrap();
    l.provide(0, account("a"), units(100), Some(fe)).unwrap();
    l.provide(0, account("b"), units(100), None).unwrap();

    l.offset(0, authority(), units(100), Decimal::ZERO).unwrap();
    assert_close(l.compounded_front_end_stake(fe).unwrap(), units(50), 200);

    let s = l.withdraw(0, account("a"), units(20)).unwrap();
    let fe_after = s.front_end.unwrap();
    assert_close(fe_after.new_stake, units(30), 200);
    assert_close(l.compounded_deposit(account("a")).unwrap(), units(30), 200);
}

#[test]
fn mixed_tags_share_issuance_correctly() {
    let mut l = ledger();
    let fe = account("frontend");
    l.register_front_end(fe, dec("0.25")).unwrap();
    l.provide(0, account("tagged"), units(300), Some(fe)).unwrap();
    l.provide(0, account("direct"), units(100), None).unwrap();

    l.issuance_mut().unwrap().grant(units(400)).unwrap();
    l.offset(60, authority(), Decimal::ZERO, Decimal::ZERO).unwrap();

    assert_eq!(l.depositor_reward_gain(account("direct")).unwrap(), units(100));
    assert_eq!(l.depositor_reward_gain(account("tagged")).unwrap(), units(75));
    assert_eq!(l.front_end_reward_gain(fe).unwrap(), units(225));
}

#[test]
fn issuance_is_not_consumed_while_pool_is_empty() {
    let mut l = ledger();
    l.issuance_mut().unwrap().grant(units(1_000)).unwrap();

    // The first deposit lands in an empty pool: nothing is read.
    l.provide(60, account("a"), units(10), None).unwrap();
    assert_eq!(l.issuance().pending(), units(1_000));
    assert_eq!(l.reward_sum_at(0, 0), Decimal::ZERO);

    // The next operation folds everything in for the sole depositor.
    l.provide(120, account("b"), units(10), None).unwrap();
    assert_eq!(l.issuance().pending(), Decimal::ZERO);
    assert_eq!(l.depositor_reward_gain(account("a")).unwrap(), units(1_000));
    assert_eq!(l.depositor_reward_gain(account("b")).unwrap(), Decimal::ZERO);
}

#[test]
fn pool_operates_before_issuance_starts() {
    let deployed = 1_000;
    let mut l = PoolLedger::new(DecayingIssuance::with_defaults(deployed), authority());
    l.provide(0, account("a"), units(10), None).unwrap();
    l.provide(0, account("b"), units(10), None).unwrap();

    let out = l.withdraw(0, account("a"), units(1)).unwrap();
    assert_eq!(out.new_deposit, units(9));
    assert_eq!(out.reward_gain, Decimal::ZERO);
    l.offset(500, authority(), units(2), units(1)).unwrap();
    assert_eq!(l.issuance().total_issued(), Decimal::ZERO);
    assert_eq!(l.pending_issuance(999).unwrap(), Decimal::ZERO);

    // Issuance starts counting at deployment.
    let later = l.withdraw(deployed + 120, account("b"), Decimal::ZERO).unwrap();
    assert!(later.reward_gain > Decimal::ZERO);
    assert!(l.issuance().total_issued() > Decimal::ZERO);
}

// ---------------------------------------------------------------------------
// Getters and failures
// ---------------------------------------------------------------------------

#[test]
fn getters_are_idempotent_and_pure() {
    let mut l = ledger_with(&[("a", 100), ("b", 50)]);
    l.offset(0, authority(), units(30), units(3)).unwrap();
    let scalars = l.scalars();

    for _ in 0..3 {
        assert_eq!(
            l.compounded_deposit(account("a")).unwrap(),
            l.compounded_deposit(account("a")).unwrap()
        );
        assert_eq!(
            l.depositor_collateral_gain(account("b")).unwrap(),
            l.depositor_collateral_gain(account("b")).unwrap()
        );
    }
    assert_eq!(l.scalars(), scalars);
}

#[test]
fn failed_operations_leave_no_trace() {
    let mut l = ledger_with(&[("a", 100)]);
    l.issuance_mut().unwrap().grant(units(5)).unwrap();
    let scalars = l.scalars();
    let deposit = l.deposit(account("a")).cloned();

    assert!(matches!(
        l.withdraw(60, account("a"), units(101)),
        Err(PoolError::InsufficientBalance { .. })
    ));
    assert!(matches!(
        l.offset(60, account("a"), units(1), units(1)),
        Err(PoolError::PreconditionViolated(_))
    ));
    assert!(matches!(
        l.provide(60, account("a"), units(1), Some(account("ghost"))),
        Err(PoolError::InvalidParameter(_))
    ));

    assert_eq!(l.scalars(), scalars);
    assert_eq!(l.deposit(account("a")).cloned(), deposit);
    assert_eq!(l.issuance().pending(), units(5));
}
