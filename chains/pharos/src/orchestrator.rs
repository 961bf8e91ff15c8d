//! Cycle orchestration.
//!
//! Per wallet the orchestrator walks
//! `INIT → FAUCET → CHECKIN → TRANSFERS → WRAPS → UNWRAPS → DONE`. Every
//! iteration is failure-isolated; only a failure to open the wallet's
//! session aborts the rest of that wallet. Wallets run strictly one after
//! another and cycles repeat until the cancellation token fires.

use crate::config::{Amounts, PharosConfig};
use crate::executor::OperationExecutor;
use crate::ledger::{AlloyBackend, ChainBackend, LedgerClient};
use crate::service::{ApiTransport, HttpTransport, ServiceClient};
use crate::wallet::WalletIdentity;
use alloy::primitives::Address;
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{
    redact_credentials, CycleSummary, DelayRange, OperationKind, OperationOutcome,
    RelaySelector, ResultTracker, WorkerRunner,
};
use rand::seq::SliceRandom;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Ledger and service clients bound to one wallet and relay.
pub struct WalletSession<B, T> {
    pub ledger: LedgerClient<B>,
    pub service: ServiceClient<T>,
}

/// Builds the network and signing context for a wallet.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Backend: ChainBackend;
    type Transport: ApiTransport;

    async fn open(
        &self,
        wallet: &WalletIdentity,
        relay: Option<&str>,
    ) -> Result<WalletSession<Self::Backend, Self::Transport>>;
}

/// Production factory: alloy JSON-RPC plus the reqwest REST transport.
pub struct AlloySessionFactory {
    config: PharosConfig,
    wrapped_token: Address,
}

impl AlloySessionFactory {
    pub fn new(config: &PharosConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            wrapped_token: config.wrapped_token()?,
        })
    }
}

#[async_trait]
impl SessionFactory for AlloySessionFactory {
    type Backend = AlloyBackend;
    type Transport = HttpTransport;

    async fn open(
        &self,
        wallet: &WalletIdentity,
        relay: Option<&str>,
    ) -> Result<WalletSession<AlloyBackend, HttpTransport>> {
        let backend = AlloyBackend::connect(
            &self.config.network.rpc_endpoint,
            wallet.signer().clone(),
            relay,
            self.config.network.chain_id,
            self.config.gas,
        )
        .await
        .context("Failed to connect to RPC")?;

        let transport = HttpTransport::new(&self.config.api.base_url, relay, self.config.api_timeout())
            .context("Failed to build API client")?;

        Ok(WalletSession {
            ledger: LedgerClient::new(backend, self.wrapped_token, &self.config.gas),
            service: ServiceClient::new(
                transport,
                wallet.signer().clone(),
                &self.config.api.invite_code,
                self.config.api.retry,
            ),
        })
    }
}

/// Everything one run needs, constructed once at startup.
pub struct RunContext {
    pub config: PharosConfig,
    pub amounts: Amounts,
    pub wallets: Vec<WalletIdentity>,
    pub targets: Vec<Address>,
    pub relays: RelaySelector,
    pub tracker: ResultTracker,
    pub executor: OperationExecutor,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn new(
        config: PharosConfig,
        wallets: Vec<WalletIdentity>,
        targets: Vec<Address>,
        relays: RelaySelector,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let amounts = config.amounts()?;
        let executor = OperationExecutor::new(
            config.retry,
            config.params.randomize,
            config.params.variation,
        );
        let tracker = ResultTracker::new(config.planned_counts());
        Ok(Self {
            config,
            amounts,
            wallets,
            targets,
            relays,
            tracker,
            executor,
            cancel,
        })
    }
}

/// Marker for a run cut short by the cancellation token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cancelled;

type Step = std::result::Result<(), Cancelled>;

pub struct CycleOrchestrator<F> {
    ctx: RunContext,
    factory: F,
}

impl<F: SessionFactory> CycleOrchestrator<F> {
    pub fn new(ctx: RunContext, factory: F) -> Self {
        Self { ctx, factory }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run cycles until cancelled, or until `max_cycles` have completed.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> Result<()> {
        let mut cycle = 0u64;
        loop {
            if self.ctx.cancel.is_cancelled() {
                break;
            }
            cycle += 1;

            info!("=== STARTING CYCLE #{} ===", cycle);
            let summary = self.run_cycle(cycle).await;
            info!(target: "task_result", "{}", summary);

            if self.ctx.cancel.is_cancelled() {
                break;
            }
            if max_cycles.is_some_and(|max| cycle >= max) {
                info!("Reached {} cycle(s), stopping", cycle);
                break;
            }
            if self.countdown(self.ctx.config.cycle_interval()).await.is_err() {
                break;
            }
        }

        info!("🛑 Shutdown Complete.");
        Ok(())
    }

    /// Process every wallet once and return the cycle summary.
    pub async fn run_cycle(&mut self, cycle: u64) -> CycleSummary {
        self.ctx.tracker.start_cycle(cycle);
        let total = self.ctx.wallets.len();

        for index in 0..total {
            if self.ctx.cancel.is_cancelled() {
                break;
            }

            if self.run_wallet(index).await.is_err() {
                break;
            }

            if index + 1 < total {
                let delay = self.ctx.config.timing.between_wallets;
                if self.pause(delay).await.is_err() {
                    break;
                }
            }
        }

        let stats = self.ctx.relays.stats();
        if stats.total > 0 {
            info!(
                "Relays: {} total | {} available | {} excluded",
                stats.total, stats.available, stats.excluded
            );
        }
        self.ctx.tracker.summary()
    }

    async fn run_wallet(&mut self, index: usize) -> Step {
        let wallet = self.ctx.wallets[index].clone();
        let total = self.ctx.wallets.len();
        let address = wallet.address().to_string();
        info!(
            "[{}/{}] {} STARTING INTERACTIONS",
            index + 1,
            total,
            wallet.short_address()
        );
        self.ctx.tracker.begin_wallet(&address);

        let relay = self.ctx.relays.next();
        match &relay {
            Some(uri) => info!("Using proxy: {}", redact_credentials(uri)),
            None => info!("No proxy available, using direct connection"),
        }

        let cancel = self.ctx.cancel.clone();
        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled),
            opened = self.factory.open(&wallet, relay.as_deref()) => opened,
        };
        let mut session = match opened {
            Ok(session) => session,
            Err(e) => {
                error!("Error processing wallet {}: {:#}", index + 1, e);
                self.ctx.tracker.record_wallet_error(&address, format!("{:#}", e));
                if let Some(uri) = &relay {
                    self.ctx.relays.record_failure(uri);
                }
                return Ok(());
            }
        };

        // In-flight ledger and service calls, retries included, are dropped on cancel
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("Wallet {} interrupted by shutdown", index + 1);
                Err(Cancelled)
            }
            step = self.drive_wallet(&wallet, &mut session) => step,
        };

        if outcome.is_ok() {
            if let Some(uri) = &relay {
                self.ctx.relays.record_success(uri);
            }
            info!("Wallet {} processing completed Successfully", index + 1);
        }
        outcome
    }

    async fn drive_wallet<B: ChainBackend, T: ApiTransport>(
        &mut self,
        wallet: &WalletIdentity,
        session: &mut WalletSession<B, T>,
    ) -> Step {
        let address = wallet.address().to_string();
        let steps = self.ctx.config.timing.between_steps;
        let params = self.ctx.config.params.clone();

        match session.ledger.balances().await {
            Ok(b) => info!(
                "Initial Balances - native: {} | wrapped: {}",
                b.native_formatted(),
                b.wrapped_formatted()
            ),
            Err(e) => warn!("Failed to fetch initial balances: {:#}", e),
        }

        // FAUCET
        info!("STEP 1: FAUCET CLAIM");
        let outcome = match session.service.claim_faucet().await {
            Ok(outcome) => outcome,
            Err(e) => OperationOutcome::failure(OperationKind::Faucet, e.to_string()),
        };
        self.report(&address, &outcome);
        self.pause(steps).await?;

        // CHECKIN
        info!("STEP 2: DAILY CHECK-IN");
        let outcome = match session.service.daily_check_in().await {
            Ok(outcome) => outcome,
            Err(e) => OperationOutcome::failure(OperationKind::Checkin, e.to_string()),
        };
        self.report(&address, &outcome);
        self.pause(steps).await?;

        // TRANSFERS
        info!("STEP 3: TRANSFERS");
        let mut done = 0u32;
        if self.ctx.targets.is_empty() {
            warn!("No target addresses configured. Skipping transfers.");
        } else {
            for i in 0..params.transfer_count {
                let Some(&target) = self.ctx.targets.choose(&mut rand::thread_rng()) else {
                    break;
                };
                let amount = self.ctx.executor.amount(&self.ctx.amounts.transfer);
                info!("Transfer {}: {} to {}", i + 1, amount, target);

                let ledger = &session.ledger;
                let outcome = self
                    .ctx
                    .executor
                    .execute(&format!("Transfer {}", i + 1), || ledger.transfer(target, &amount))
                    .await
                    .unwrap_or_else(|e| OperationOutcome::failure(OperationKind::Transfer, e.to_string()));
                done += u32::from(outcome.success);
                self.report(&address, &outcome);
                self.pause(steps).await?;
            }
        }
        info!("Completed {}/{} transfers", done, params.transfer_count);

        // WRAPS
        info!("STEP 4: WRAP");
        let mut done = 0u32;
        for i in 0..params.wrap_count {
            let amount = self.ctx.executor.amount(&self.ctx.amounts.wrap);
            info!("Wrap {}: {}", i + 1, amount);

            let ledger = &session.ledger;
            let outcome = self
                .ctx
                .executor
                .execute(&format!("Wrap {}", i + 1), || ledger.wrap_deposit(&amount))
                .await
                .unwrap_or_else(|e| OperationOutcome::failure(OperationKind::Wrap, e.to_string()));
            done += u32::from(outcome.success);
            self.report(&address, &outcome);
            self.pause(steps).await?;
        }
        info!("Completed {}/{} wraps", done, params.wrap_count);

        // UNWRAPS
        info!("STEP 5: UNWRAP");
        let mut done = 0u32;
        let total = params.unwrap_count;
        for i in 0..total {
            let amount = self.ctx.executor.amount(&self.ctx.amounts.unwrap);
            if i + 1 == total {
                info!("Unwrap {}: entire remaining balance", i + 1);
            } else {
                info!("Unwrap {}: {}", i + 1, amount);
            }

            let ledger = &session.ledger;
            let outcome = self
                .ctx
                .executor
                .execute(&format!("Unwrap {}", i + 1), || ledger.unwrap_withdraw(i, total, &amount))
                .await
                .unwrap_or_else(|e| OperationOutcome::failure(OperationKind::Unwrap, e.to_string()));
            done += u32::from(outcome.success);
            self.report(&address, &outcome);
            if i + 1 < total {
                self.pause(steps).await?;
            }
        }
        info!("Completed {}/{} unwraps", done, total);

        match session.ledger.balances().await {
            Ok(b) => info!(
                "Final Balances - native: {} | wrapped: {}",
                b.native_formatted(),
                b.wrapped_formatted()
            ),
            Err(e) => warn!("Failed to fetch final balances: {:#}", e),
        }
        Ok(())
    }

    fn report(&mut self, address: &str, outcome: &OperationOutcome) {
        info!(target: "task_result", "{}", outcome);
        self.ctx.tracker.record(address, outcome);
    }

    async fn pause(&self, range: DelayRange) -> Step {
        if WorkerRunner::pace(&self.ctx.cancel, range.sample()).await {
            Ok(())
        } else {
            Err(Cancelled)
        }
    }

    async fn countdown(&self, total: Duration) -> Step {
        let tick = Duration::from_secs(60);
        let mut remaining = total;
        while !remaining.is_zero() {
            info!("Next cycle in {}m {}s", remaining.as_secs() / 60, remaining.as_secs() % 60);
            let step = remaining.min(tick);
            if !WorkerRunner::pace(&self.ctx.cancel, step).await {
                return Err(Cancelled);
            }
            remaining -= step;
        }
        Ok(())
    }
}
