//! Protocol constants. All amounts are 18-decimal fixed point (1.0 = 10^18 raw units).

/// Raw units per whole token.
///
/// Also the denominator of every fixed-point ratio in the pool: the running
/// product `P`, kickback fractions, and per-unit loss and gain values.
pub const DECIMAL_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Rescale factor applied to `P` when a loss would push it below this many raw units.
///
/// A deposit snapshotted one scale ago is divided by this factor once;
/// two or more scales ago it has decayed below precision and reads as zero.
pub const SCALE_FACTOR: u128 = 1_000_000_000;

/// A compounded value smaller than `initial_value / DUST_DIVISOR` reads as zero.
pub const DUST_DIVISOR: u128 = 1_000_000_000;

/// Default reward token supply released to the pool over the whole schedule, in whole tokens.
pub const DEFAULT_ISSUANCE_SUPPLY_CAP: u64 = 32_000_000;

/// Default per-minute retention factor of the issuance curve (raw, 18 decimals).
///
/// `0.999998681227695^525600 ≈ 0.5`: half of the remaining supply is issued each year.
pub const DEFAULT_ISSUANCE_FACTOR_RAW: u128 = 999_998_681_227_695_000;

pub const SECONDS_IN_ONE_MINUTE: u64 = 60;

/// Elapsed minutes are capped here (1000 years) to bound the exponentiation loop.
pub const MAX_ISSUANCE_MINUTES: u64 = 525_600_000;
