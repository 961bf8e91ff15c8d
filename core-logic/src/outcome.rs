use serde::Serialize;
use std::fmt;

/// The five operation kinds driven per wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Faucet,
    Checkin,
    Transfer,
    Wrap,
    Unwrap,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Faucet => "faucet",
            OperationKind::Checkin => "checkin",
            OperationKind::Transfer => "transfer",
            OperationKind::Wrap => "wrap",
            OperationKind::Unwrap => "unwrap",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one operation attempt. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub kind: OperationKind,
    pub success: bool,
    pub message: String,
    pub amount: Option<String>,
    pub tx_hash: Option<String>,
}

impl OperationOutcome {
    pub fn success(kind: OperationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            success: true,
            message: message.into(),
            amount: None,
            tx_hash: None,
        }
    }

    pub fn failure(kind: OperationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            success: false,
            message: message.into(),
            amount: None,
            tx_hash: None,
        }
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{}] {}: {}", self.kind, status, self.message)?;
        if let Some(amount) = &self.amount {
            write!(f, " | amount {}", amount)?;
        }
        if let Some(tx) = &self.tx_hash {
            write!(f, " | tx {}", tx)?;
        }
        Ok(())
    }
}
