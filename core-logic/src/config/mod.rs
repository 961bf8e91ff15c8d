use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Full URI with credentials inlined, as accepted by HTTP clients.
    pub fn to_uri(&self) -> String {
        match (&self.username, self.url.split_once("://")) {
            (Some(user), Some((scheme, host))) => format!(
                "{}://{}:{}@{}",
                scheme,
                user,
                self.password.as_deref().unwrap_or_default(),
                host
            ),
            _ => self.url.clone(),
        }
    }
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_endpoint: String,
    pub chain_id: u64,
}

impl ChainConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.rpc_endpoint.starts_with("http://") || self.rpc_endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidRpcUrl {
                url: self.rpc_endpoint.clone(),
            });
        }
        Ok(())
    }
}

/// Inclusive millisecond range a pacing delay is drawn from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidValue {
                field: field.to_string(),
                reason: format!("min {}ms exceeds max {}ms", self.min_ms, self.max_ms),
            });
        }
        Ok(())
    }

    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.min_ms >= self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.gen_range(self.min_ms..=self.max_ms))
    }
}
