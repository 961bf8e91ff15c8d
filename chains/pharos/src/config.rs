use crate::amount::Amount;
use crate::inputs::TARGETS_FILE;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use core_logic::{
    ChainConfig, ConfigError, DelayRange, GasConfig, PlannedCounts, ProxyManager, RetryPolicy,
    WalletManager,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    pub wrapped_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub invite_code: String,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause between iterations and between steps.
    pub between_steps: DelayRange,
    pub between_wallets: DelayRange,
    /// Countdown before the next cycle starts.
    pub cycle_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionParams {
    pub transfer_amount: String,
    pub wrap_amount: String,
    pub unwrap_amount: String,
    pub transfer_count: u32,
    pub wrap_count: u32,
    pub unwrap_count: u32,
    pub randomize: bool,
    pub variation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputFiles {
    pub keys: String,
    pub proxies: String,
    pub targets: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharosConfig {
    pub network: ChainConfig,
    pub contracts: ContractConfig,
    pub api: ApiConfig,
    pub timing: TimingConfig,
    pub params: InteractionParams,
    /// Ledger-operation retry policy.
    pub retry: RetryPolicy,
    pub gas: GasConfig,
    pub files: InputFiles,
}

impl Default for PharosConfig {
    fn default() -> Self {
        Self {
            network: ChainConfig {
                name: "Pharos Testnet".to_string(),
                rpc_endpoint: "https://testnet.dplabs-internal.com".to_string(),
                chain_id: 688688,
            },
            contracts: ContractConfig {
                wrapped_token: "0x76aaada469d23216be5f7c596fa25f282ff9b364".to_string(),
            },
            api: ApiConfig {
                base_url: "https://api.pharosnetwork.xyz".to_string(),
                invite_code: "pcDSvtHJeoqTPMAU".to_string(),
                timeout_secs: 30,
                retry: RetryPolicy::linear(3, 2000),
            },
            timing: TimingConfig {
                between_steps: DelayRange::new(2000, 5000),
                between_wallets: DelayRange::new(5000, 15000),
                cycle_interval_secs: 30 * 60,
            },
            params: InteractionParams {
                transfer_amount: "0.000001234".to_string(),
                wrap_amount: "0.000005342".to_string(),
                unwrap_amount: "0.000004321".to_string(),
                transfer_count: 10,
                wrap_count: 10,
                unwrap_count: 10,
                randomize: true,
                variation: 0.1,
            },
            retry: RetryPolicy::exponential(3, 1000),
            gas: GasConfig::default(),
            files: InputFiles {
                keys: WalletManager::PV_FILE.to_string(),
                proxies: ProxyManager::PROXY_FILE.to_string(),
                targets: TARGETS_FILE.to_string(),
            },
        }
    }
}

/// Parsed operation amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amounts {
    pub transfer: Amount,
    pub wrap: Amount,
    pub unwrap: Amount,
}

fn config_error(e: config::ConfigError) -> ConfigError {
    ConfigError::InvalidValue {
        field: "config".to_string(),
        reason: e.to_string(),
    }
}

impl PharosConfig {
    /// Layer built-in defaults, the optional TOML file at `path` and
    /// `PHAROS__SECTION__KEY` environment variables, then validate.
    ///
    /// Environment values stay strings until deserialization so amount
    /// literals such as `1.50` keep their fractional digits.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let defaults = Config::try_from(&PharosConfig::default()).map_err(config_error)?;

        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("PHAROS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(config_error)?;

        let config: PharosConfig = settings.try_deserialize().map_err(config_error)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.wrapped_token()?;
        self.amounts()?;
        self.timing.between_steps.validate("timing.between_steps")?;
        self.timing.between_wallets.validate("timing.between_wallets")?;

        if !(0.0..1.0).contains(&self.params.variation) {
            return Err(ConfigError::InvalidValue {
                field: "params.variation".to_string(),
                reason: format!("{} is outside [0, 1)", self.params.variation),
            });
        }
        if self.api.invite_code.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api.invite_code".to_string(),
            });
        }
        Ok(())
    }

    pub fn wrapped_token(&self) -> Result<Address, ConfigError> {
        Address::from_str(&self.contracts.wrapped_token).map_err(|e| ConfigError::InvalidValue {
            field: "contracts.wrapped_token".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn amounts(&self) -> Result<Amounts, ConfigError> {
        let parse = |field: &str, value: &str| {
            value.parse::<Amount>().map_err(|e| ConfigError::InvalidValue {
                field: field.to_string(),
                reason: e.to_string(),
            })
        };
        Ok(Amounts {
            transfer: parse("params.transfer_amount", &self.params.transfer_amount)?,
            wrap: parse("params.wrap_amount", &self.params.wrap_amount)?,
            unwrap: parse("params.unwrap_amount", &self.params.unwrap_amount)?,
        })
    }

    pub fn planned_counts(&self) -> PlannedCounts {
        PlannedCounts {
            transfers: self.params.transfer_count,
            wraps: self.params.wrap_count,
            unwraps: self.params.unwrap_count,
        }
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.timing.cycle_interval_secs)
    }
}
