//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid RPC URL format: '{url}'")]
    InvalidRpcUrl { url: String },

    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("No wallet secrets available in {path}")]
    NoCredentials { path: String },

    #[error("I/O error reading {path}: {msg}")]
    IoError { path: String, msg: String },
}

/// Wallet and key-handling errors
#[derive(Error, Debug, Clone)]
pub enum WalletError {
    #[error("Invalid private key format: expected 0x-prefixed hex string")]
    InvalidKeyFormat,

    #[error("Private key has wrong length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },
}

/// Network, RPC and REST transport errors.
///
/// The three transport categories mirror what a caller can act on: the
/// server answered with a failing status, nothing answered at all, or the
/// request could not even be built/sent.
#[derive(Error, Debug, Clone)]
pub enum NetworkError {
    #[error("API error {status_code} from {endpoint}: {body}")]
    HttpStatus {
        status_code: u16,
        endpoint: String,
        body: String,
    },

    #[error("No response from {endpoint}: {reason}")]
    NoResponse { endpoint: String, reason: String },

    #[error("Request to {endpoint} failed: {reason}")]
    Request { endpoint: String, reason: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

impl NetworkError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Authorization failures and undecodable payloads are not transient;
    /// everything else (5xx, 429, timeouts, resets) is.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::HttpStatus { status_code, .. } => !matches!(status_code, 400..=404),
            NetworkError::NoResponse { .. } => true,
            NetworkError::Request { .. } => true,
            NetworkError::InvalidResponse { .. } => false,
        }
    }

    /// Whether the server rejected our credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            NetworkError::HttpStatus {
                status_code: 401 | 403,
                ..
            }
        )
    }
}
