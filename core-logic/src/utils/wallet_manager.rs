use crate::error::{ConfigError, WalletError};
use crate::utils::input::read_entries;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroizing;

/// A raw wallet secret as read from the credential list.
///
/// The key material is zeroed on drop and never printed.
#[derive(Clone)]
pub struct WalletSecret {
    index: usize,
    key: Zeroizing<String>,
}

impl WalletSecret {
    pub fn parse(index: usize, raw: &str) -> Result<Self, WalletError> {
        let raw = raw.trim();
        let hex = raw.strip_prefix("0x").ok_or(WalletError::InvalidKeyFormat)?;
        if hex.len() != 64 {
            return Err(WalletError::InvalidKeyLength { length: hex.len() });
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKeyFormat);
        }
        Ok(Self {
            index,
            key: Zeroizing::new(raw.to_string()),
        })
    }

    /// Position in the credential list, used for log labels.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn expose(&self) -> &str {
        self.key.as_str()
    }
}

impl fmt::Debug for WalletSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSecret")
            .field("index", &self.index)
            .field("key", &"***REDACTED***")
            .finish()
    }
}

pub struct WalletManager;

impl WalletManager {
    pub const PV_FILE: &'static str = "privatekeys.txt";

    /// Load wallet secrets, skipping malformed lines.
    pub fn load_secrets(path: impl AsRef<Path>) -> Result<Vec<WalletSecret>, ConfigError> {
        let path = path.as_ref();
        let mut secrets = Vec::new();

        for (line_no, line) in read_entries(path)?.iter().enumerate() {
            match WalletSecret::parse(secrets.len(), line) {
                Ok(secret) => secrets.push(secret),
                Err(e) => warn!("Skipping line {} of {}: {}", line_no + 1, path.display(), e),
            }
        }

        info!("Loaded {} wallets from {}", secrets.len(), path.display());
        Ok(secrets)
    }

    /// Like [`load_secrets`](Self::load_secrets) but fails when nothing usable was found.
    pub fn require_secrets(path: impl AsRef<Path>) -> Result<Vec<WalletSecret>, ConfigError> {
        let path = path.as_ref();
        let secrets = Self::load_secrets(path)?;
        if secrets.is_empty() {
            return Err(ConfigError::NoCredentials {
                path: path.display().to_string(),
            });
        }
        Ok(secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    #[test]
    fn test_parse_valid_secret() {
        let secret = WalletSecret::parse(0, KEY).unwrap();
        assert_eq!(secret.expose(), KEY);
    }

    #[test]
    fn test_reject_missing_prefix() {
        let err = WalletSecret::parse(0, &KEY[2..]).unwrap_err();
        assert!(matches!(err, WalletError::InvalidKeyFormat));
    }

    #[test]
    fn test_reject_short_key() {
        let err = WalletSecret::parse(0, "0xabc").unwrap_err();
        assert!(matches!(err, WalletError::InvalidKeyLength { length: 3 }));
    }

    #[test]
    fn test_debug_redacts() {
        let secret = WalletSecret::parse(3, KEY).unwrap();
        let shown = format!("{:?}", secret);
        assert!(!shown.contains(&KEY[2..]));
        assert!(shown.contains("REDACTED"));
    }
}
