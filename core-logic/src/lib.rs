//! # Core Logic - Shared Utilities for Testnet Bots
//!
//! Chain-agnostic building blocks used by the chain crates.
//!
//! ## Modules
//!
//! - [`config`] - Proxy, chain and delay-range configuration primitives
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Per-cycle result aggregation
//! - [`outcome`] - Operation kinds and outcomes
//! - [`utils`] - Retry policy, relay selection, input loading, logging

pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub(crate) mod utils;

pub use config::{ChainConfig, DelayRange, ProxyConfig};
pub use error::{ConfigError, NetworkError, WalletError};
pub use metrics::{CycleSummary, CycleTotals, PlannedCounts, ResultTracker, WalletResult};
pub use outcome::{OperationKind, OperationOutcome};

pub use utils::{
    read_entries, redact_credentials, setup_logger, GasConfig, ProxyManager, RelayEndpoint,
    RelaySelector, RelayStats, StandardGasLimits, TerminalFormatter, WalletManager,
    WalletSecret, WorkerRunner, DEFAULT_DIRECTIVES,
};

pub use utils::retry::{with_retry, with_retry_if, Backoff, RetryError, RetryPolicy};
