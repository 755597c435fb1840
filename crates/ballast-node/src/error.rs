//! Error types for hosting the pool.
use thiserror::Error;
use tracing_subscriber::util::TryInitError;

use ballast_core::error::IssuanceError;
use ballast_core::PoolError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")] Load(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")] Invalid(String),
}

/// Failures while assembling a [`PoolService`](crate::PoolService) from configuration.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Pool(#[from] PoolError),
    #[error("logging initialisation failed: {0}")] Logging(#[from] TryInitError),
}

impl From<IssuanceError> for NodeError {
    fn from(err: IssuanceError) -> Self {
        Self::Pool(err.into())
    }
}
