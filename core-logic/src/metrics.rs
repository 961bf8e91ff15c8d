//! Per-cycle result aggregation.
//!
//! A [`ResultTracker`] is owned by the run context and reset at the start
//! of every cycle. It keeps one [`WalletResult`] per address, in the order
//! wallets were processed, plus global [`CycleTotals`].

use crate::outcome::{OperationKind, OperationOutcome};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Planned iteration counts, used to render `done/planned` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlannedCounts {
    pub transfers: u32,
    pub wraps: u32,
    pub unwraps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct WalletResult {
    pub address: String,
    pub faucet: bool,
    pub checkin: bool,
    pub transfers: u32,
    pub wraps: u32,
    pub unwraps: u32,
    pub error: Option<String>,
}

impl WalletResult {
    fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            ..Default::default()
        }
    }
}

/// Global counters for one cycle.
///
/// The per-kind fields count attempts; `successful_ops` and `total_ops`
/// count outcomes across all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CycleTotals {
    pub faucets: u64,
    pub checkins: u64,
    pub transfers: u64,
    pub wraps: u64,
    pub unwraps: u64,
    pub successful_ops: u64,
    pub total_ops: u64,
    pub wallets_processed: u64,
}

impl CycleTotals {
    pub fn success_rate(&self) -> f64 {
        if self.total_ops == 0 {
            0.0
        } else {
            self.successful_ops as f64 / self.total_ops as f64 * 100.0
        }
    }
}

#[derive(Debug)]
pub struct ResultTracker {
    cycle: u64,
    started_at: DateTime<Local>,
    planned: PlannedCounts,
    wallets: Vec<WalletResult>,
    totals: CycleTotals,
}

impl ResultTracker {
    pub fn new(planned: PlannedCounts) -> Self {
        Self {
            cycle: 0,
            started_at: Local::now(),
            planned,
            wallets: Vec::new(),
            totals: CycleTotals::default(),
        }
    }

    /// Clear all per-cycle state.
    pub fn start_cycle(&mut self, cycle: u64) {
        self.cycle = cycle;
        self.started_at = Local::now();
        self.wallets.clear();
        self.totals = CycleTotals::default();
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Register a wallet as processed in this cycle.
    pub fn begin_wallet(&mut self, address: &str) {
        if self.position(address).is_none() {
            self.wallets.push(WalletResult::new(address));
            self.totals.wallets_processed += 1;
        }
    }

    pub fn record(&mut self, address: &str, outcome: &OperationOutcome) {
        self.begin_wallet(address);
        let totals = &mut self.totals;
        totals.total_ops += 1;
        if outcome.success {
            totals.successful_ops += 1;
        }

        let Some(idx) = self.position(address) else {
            return;
        };
        let wallet = &mut self.wallets[idx];
        let totals = &mut self.totals;
        match outcome.kind {
            OperationKind::Faucet => {
                totals.faucets += 1;
                wallet.faucet |= outcome.success;
            }
            OperationKind::Checkin => {
                totals.checkins += 1;
                wallet.checkin |= outcome.success;
            }
            OperationKind::Transfer => {
                totals.transfers += 1;
                wallet.transfers += u32::from(outcome.success);
            }
            OperationKind::Wrap => {
                totals.wraps += 1;
                wallet.wraps += u32::from(outcome.success);
            }
            OperationKind::Unwrap => {
                totals.unwraps += 1;
                wallet.unwraps += u32::from(outcome.success);
            }
        }
    }

    /// Note an error that aborted the rest of a wallet's run.
    pub fn record_wallet_error(&mut self, address: &str, error: impl Into<String>) {
        self.begin_wallet(address);
        if let Some(idx) = self.position(address) {
            self.wallets[idx].error = Some(error.into());
        }
    }

    pub fn wallet(&self, address: &str) -> Option<&WalletResult> {
        self.position(address).map(|idx| &self.wallets[idx])
    }

    pub fn wallets(&self) -> &[WalletResult] {
        &self.wallets
    }

    pub fn totals(&self) -> CycleTotals {
        self.totals
    }

    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            cycle: self.cycle,
            started_at: self.started_at,
            planned: self.planned,
            wallets: self.wallets.clone(),
            totals: self.totals,
        }
    }

    fn position(&self, address: &str) -> Option<usize> {
        self.wallets.iter().position(|w| w.address == address)
    }
}

/// Snapshot of a finished cycle, rendered as a console table.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u64,
    #[serde(skip)]
    pub started_at: DateTime<Local>,
    pub planned: PlannedCounts,
    pub wallets: Vec<WalletResult>,
    pub totals: CycleTotals,
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "✅"
    } else {
        "❌"
    }
}

fn short_address(address: &str) -> String {
    if address.len() > 12 {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cycle #{} summary (started {})",
            self.cycle,
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        )?;
        writeln!(
            f,
            "{:<15} {:^8} {:^8} {:>9} {:>9} {:>9}",
            "Wallet", "Faucet", "Check-in", "Transfers", "Wraps", "Unwraps"
        )?;
        for w in &self.wallets {
            writeln!(
                f,
                "{:<15} {:^8} {:^8} {:>9} {:>9} {:>9}{}",
                short_address(&w.address),
                mark(w.faucet),
                mark(w.checkin),
                format!("{}/{}", w.transfers, self.planned.transfers),
                format!("{}/{}", w.wraps, self.planned.wraps),
                format!("{}/{}", w.unwraps, self.planned.unwraps),
                w.error
                    .as_ref()
                    .map(|e| format!("  (aborted: {})", e))
                    .unwrap_or_default()
            )?;
        }
        write!(
            f,
            "Wallets: {} | Operations: {}/{} | Success Rate: {:.2}%",
            self.totals.wallets_processed,
            self.totals.successful_ops,
            self.totals.total_ops,
            self.totals.success_rate()
        )
    }
}
