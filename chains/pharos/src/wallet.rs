use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use core_logic::{WalletError, WalletSecret};
use std::fmt;

/// A wallet secret bound to its signer and derived address.
#[derive(Clone)]
pub struct WalletIdentity {
    secret: WalletSecret,
    signer: PrivateKeySigner,
    address: Address,
}

impl WalletIdentity {
    pub fn from_secret(secret: WalletSecret, chain_id: u64) -> Result<Self, WalletError> {
        let signer: PrivateKeySigner = secret
            .expose()
            .parse()
            .map_err(|_| WalletError::InvalidKeyFormat)?;
        let signer = signer.with_chain_id(Some(chain_id));
        let address = signer.address();
        Ok(Self {
            secret,
            signer,
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> &PrivateKeySigner {
        &self.signer
    }

    pub fn index(&self) -> usize {
        self.secret.index()
    }

    /// `0x1234...abcd`
    pub fn short_address(&self) -> String {
        let full = self.address.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("index", &self.secret.index())
            .field("address", &self.address)
            .field("secret", &"***REDACTED***")
            .finish()
    }
}
