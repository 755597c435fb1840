//! Shared test helpers for integration tests.

use ballast_core::types::AccountId;
use ballast_core::Decimal;
use ballast_issuance::ManualIssuance;
use ballast_node::{Asset, MemoryCustody, PoolService};
use ballast_pool::PoolLedger;

/// Deterministic account from a label.
pub fn account(label: &str) -> AccountId {
    AccountId::from_label(label)
}

/// The account allowed to offset debt in every test pool.
pub fn authority() -> AccountId {
    account("liquidations")
}

/// Whole tokens.
pub fn units(n: u64) -> Decimal {
    Decimal::from_units(n)
}

/// Parse a decimal literal such as `"0.5"`.
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Absolute difference of two decimals.
pub fn abs_diff(a: Decimal, b: Decimal) -> Decimal {
    if a > b { a.saturating_sub(b) } else { b.saturating_sub(a) }
}

/// Assert `actual` is within `tolerance_raw` raw units of `expected`.
#[track_caller]
pub fn assert_close(actual: Decimal, expected: Decimal, tolerance_raw: u64) {
    let diff = abs_diff(actual, expected);
    assert!(
        diff <= Decimal::from_raw(tolerance_raw),
        "{actual} differs from {expected} by {diff} (tolerance {tolerance_raw} raw)"
    );
}

/// Empty ledger with a manually funded issuance source.
pub fn ledger() -> PoolLedger<ManualIssuance> {
    PoolLedger::new(ManualIssuance::new(), authority())
}

/// Ledger with the given `(label, whole tokens)` deposits, untagged.
pub fn ledger_with(deposits: &[(&str, u64)]) -> PoolLedger<ManualIssuance> {
    let mut l = ledger();
    for (label, amount) in deposits {
        l.provide(0, account(label), units(*amount), None)
            .expect("seed deposit");
    }
    l
}

/// Service over in-memory custody, with each listed depositor holding
/// `balance` of the stable asset, the authority holding collateral and a
/// funded reward reserve.
pub fn funded_service(depositors: &[&str], balance: u64) -> PoolService<ManualIssuance> {
    let service = PoolService::new(ledger(), MemoryCustody::new());
    service
        .with_custody_mut(|c| {
            for label in depositors {
                c.mint(account(label), Asset::Deposit, units(balance))
                    .expect("mint deposit asset");
            }
            c.mint(authority(), Asset::Collateral, units(1_000_000))
                .expect("mint collateral");
            c.fund_rewards(units(1_000_000)).expect("fund rewards");
        })
        .expect("fresh service is not borrowed");
    service
}
