//! Pharos testnet interaction bot
//!
//! Cycles a set of wallets through the daily testnet routine: faucet claim,
//! check-in, native transfers, and wrap/unwrap of the wrapped native token.
//! Off-chain steps go through the Pharos REST API with a signed-message
//! login; on-chain steps go through an alloy JSON-RPC provider.
//!
//! # Architecture
//!
//! - **[`CycleOrchestrator`]**: per-wallet state machine and cycle loop
//! - **[`LedgerClient`]**: balance-aware on-chain operations over a [`ChainBackend`]
//! - **[`ServiceClient`]**: authenticated REST session over an [`ApiTransport`]
//! - **[`OperationExecutor`]**: bounded retry plus amount randomization
//! - Relay rotation, result tracking and retry policies live in `core-logic`
//!
//! # Quick Start
//!
//! ```bash
//! cargo run -p pharos-bot -- --config chains/pharos/config.toml
//! ```
//!
//! Inputs are read from `privatekeys.txt`, `proxies.txt` and `wallets.txt`
//! in the working directory unless overridden.

pub mod amount;
pub mod config;
pub mod executor;
pub mod inputs;
pub mod ledger;
pub mod orchestrator;
pub mod service;
pub mod wallet;

pub use amount::{Amount, AmountError, DecimalAmount};
pub use crate::config::{Amounts, PharosConfig};
pub use executor::OperationExecutor;
pub use ledger::{AlloyBackend, BalanceSnapshot, ChainBackend, LedgerCall, LedgerClient};
pub use orchestrator::{
    AlloySessionFactory, CycleOrchestrator, RunContext, SessionFactory, WalletSession,
};
pub use service::{ApiMethod, ApiTransport, HttpTransport, ServiceClient, ServiceError};
pub use wallet::WalletIdentity;
