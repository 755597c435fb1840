//! # ballast-core
//! Foundation types and traits for the Ballast stability pool.

pub mod constants;
pub mod decimal;
pub mod error;
pub mod traits;
pub mod types;

pub use decimal::Decimal;
pub use error::PoolError;
