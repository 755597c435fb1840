//! # ballast-node: Hosting the Ballast pool.
//!
//! Composes the pool ledger with an issuance schedule and a custody
//! collaborator behind [`PoolService`], which serialises callers and rejects
//! reentrant calls. Also provides configuration loading and logging setup.

pub mod config;
pub mod custody;
pub mod error;
pub mod logging;
pub mod service;

pub use crate::config::PoolConfig;
pub use custody::{Asset, MemoryCustody};
pub use error::{ConfigError, NodeError};
pub use service::PoolService;
