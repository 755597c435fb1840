//! # ballast-issuance: Reward-token issuance schedules.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! - **Decaying curve**: the cumulative fraction of the supply cap issued
//!   after `m` minutes is `1 - f^m`, evaluated with fixed-point binary
//!   exponentiation. With the default factor half of the remaining supply
//!   is issued each year.
//! - **Manual source**: an explicitly funded source for hosts that meter
//!   issuance themselves, and for tests.

pub mod curve;
pub mod engine;
pub mod manual;

pub use curve::{cumulative_fraction, elapsed_minutes};
pub use engine::DecayingIssuance;
pub use manual::ManualIssuance;
