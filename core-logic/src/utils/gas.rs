//! # Core Logic - Gas Configuration
//!
//! Fixed gas parameters for test networks that accept zero-priced
//! transactions. Chain crates turn these into transaction requests.

use serde::{Deserialize, Serialize};

/// Fixed gas limits per operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardGasLimits {
    pub transfer: u64,
    pub deposit: u64,
    pub withdraw: u64,
    pub approve: u64,
}

impl Default for StandardGasLimits {
    fn default() -> Self {
        Self {
            transfer: 21_000,
            deposit: 100_000,
            withdraw: 120_000,
            approve: 100_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    /// Legacy gas price in wei
    pub gas_price_wei: u64,
    /// Native amount held back for fees when checking balances, in wei
    pub buffer_wei: u64,
    pub limits: StandardGasLimits,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            gas_price_wei: 0,
            buffer_wei: 100_000_000_000, // 0.0000001 native
            limits: StandardGasLimits::default(),
        }
    }
}

impl GasConfig {
    pub fn limit_transfer(&self) -> u64 {
        self.limits.transfer
    }

    pub fn limit_deposit(&self) -> u64 {
        self.limits.deposit
    }

    pub fn limit_withdraw(&self) -> u64 {
        self.limits.withdraw
    }

    pub fn limit_approve(&self) -> u64 {
        self.limits.approve
    }
}
