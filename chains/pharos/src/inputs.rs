use alloy::primitives::Address;
use core_logic::{read_entries, ConfigError};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

pub const TARGETS_FILE: &str = "wallets.txt";

/// Load candidate transfer targets, dropping lines that are not addresses.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<Address>, ConfigError> {
    let path = path.as_ref();
    let mut targets = Vec::new();

    for line in read_entries(path)? {
        match Address::from_str(&line) {
            Ok(address) => targets.push(address),
            Err(_) => warn!("Skipping invalid address in {}: {}", path.display(), line),
        }
    }

    info!("Loaded {} target addresses from {}", targets.len(), path.display());
    Ok(targets)
}
