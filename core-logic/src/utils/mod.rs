//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod gas;
pub(crate) mod input;
pub(crate) mod logger;
pub(crate) mod proxy_manager;
pub(crate) mod relay_selector;
pub(crate) mod retry;
pub(crate) mod runner;
pub(crate) mod wallet_manager;

pub use gas::{GasConfig, StandardGasLimits};
pub use input::read_entries;
pub use logger::{setup_logger, TerminalFormatter, DEFAULT_DIRECTIVES};
pub use proxy_manager::ProxyManager;
pub use relay_selector::{redact_credentials, RelayEndpoint, RelaySelector, RelayStats};
pub use runner::WorkerRunner;
pub use wallet_manager::{WalletManager, WalletSecret};
