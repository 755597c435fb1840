//! Pool host configuration.
//!
//! [`PoolConfig`] is layered from defaults, an optional TOML file and
//! `BALLAST__*` environment variables (`__` separates nested keys, e.g.
//! `BALLAST__ISSUANCE__SUPPLY_CAP`). Amounts are decimal strings.

use std::path::Path;

use ::config::{Config, Environment, File, FileFormat, Map};
use serde::{Deserialize, Serialize};

use ballast_core::constants::{DEFAULT_ISSUANCE_FACTOR_RAW, DEFAULT_ISSUANCE_SUPPLY_CAP};
use ballast_core::types::AccountId;
use ballast_core::Decimal;

use crate::error::ConfigError;

const ENV_PREFIX: &str = "BALLAST";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Account allowed to call `offset`: 64 hex characters, or a label
    /// hashed with [`AccountId::from_label`].
    pub offset_authority: String,
    pub issuance: IssuanceConfig,
    /// Front ends registered when the service starts.
    pub front_ends: Vec<FrontEndConfig>,
    /// Log level filter string (e.g. "info", "ballast_pool=debug").
    pub log_level: String,
    /// Log output format ("text" or "json").
    pub log_format: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    pub supply_cap: Decimal,
    pub decay_factor_per_minute: Decimal,
    /// Unix seconds at which issuance starts.
    pub deployment_time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontEndConfig {
    pub operator: String,
    pub kickback: Decimal,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            offset_authority: String::new(),
            issuance: IssuanceConfig::default(),
            front_ends: Vec::new(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            supply_cap: Decimal::from_units(DEFAULT_ISSUANCE_SUPPLY_CAP),
            decay_factor_per_minute: Decimal::from_raw(DEFAULT_ISSUANCE_FACTOR_RAW),
            deployment_time: 0,
        }
    }
}

impl PoolConfig {
    /// Load from `path` (if given and present) overlaid with the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// As [`load`](Self::load), reading environment variables from `env`
    /// instead of the process when supplied.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .source(env),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without consulting the environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offset_authority.trim().is_empty() {
            return Err(ConfigError::Invalid("offset_authority must be set".into()));
        }
        if self.issuance.decay_factor_per_minute > Decimal::ONE {
            return Err(ConfigError::Invalid(format!(
                "issuance.decay_factor_per_minute {} exceeds 1",
                self.issuance.decay_factor_per_minute
            )));
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            return Err(ConfigError::Invalid(format!(
                "log_format must be \"text\" or \"json\", got {:?}",
                self.log_format
            )));
        }
        for fe in &self.front_ends {
            if fe.operator.trim().is_empty() {
                return Err(ConfigError::Invalid("front end operator must be set".into()));
            }
            if fe.kickback > Decimal::ONE {
                return Err(ConfigError::Invalid(format!(
                    "front end {} kickback {} exceeds 1",
                    fe.operator, fe.kickback
                )));
            }
        }
        Ok(())
    }

    pub fn offset_authority_id(&self) -> AccountId {
        parse_account(&self.offset_authority)
    }
}

impl FrontEndConfig {
    pub fn operator_id(&self) -> AccountId {
        parse_account(&self.operator)
    }
}

/// 64 hex characters decode directly; anything else is treated as a label.
pub fn parse_account(s: &str) -> AccountId {
    let s = s.trim();
    AccountId::from_hex(s).unwrap_or_else(|| AccountId::from_label(s))
}
