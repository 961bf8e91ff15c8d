//! On-chain access: balance reads, native transfers and wrapped-token calls.
//!
//! [`LedgerClient`] holds the balance-aware logic and talks to the chain
//! through a [`ChainBackend`]. [`AlloyBackend`] is the JSON-RPC
//! implementation; every submission waits for its receipt.

use crate::amount::Amount;
use alloy::primitives::utils::format_ether;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::Provider;
use alloy::rpc::client::ClientBuilder;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::Http;
use alloy_sol_types::{sol, SolCall};
use anyhow::{Context, Result};
use async_trait::async_trait;
use core_logic::{GasConfig, OperationKind, OperationOutcome};
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

sol!(
    interface IWrappedNative {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceSnapshot {
    pub native: U256,
    pub wrapped: U256,
}

impl BalanceSnapshot {
    pub fn native_formatted(&self) -> String {
        format_ether(self.native)
    }

    pub fn wrapped_formatted(&self) -> String {
        format_ether(self.wrapped)
    }
}

/// A state-changing call the ledger can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerCall {
    Transfer {
        to: Address,
        value: U256,
    },
    Deposit {
        token: Address,
        value: U256,
    },
    Withdraw {
        token: Address,
        amount: U256,
    },
    Approve {
        token: Address,
        spender: Address,
        amount: U256,
    },
}

impl LedgerCall {
    pub fn label(&self) -> &'static str {
        match self {
            LedgerCall::Transfer { .. } => "transfer",
            LedgerCall::Deposit { .. } => "deposit",
            LedgerCall::Withdraw { .. } => "withdraw",
            LedgerCall::Approve { .. } => "approve",
        }
    }

    /// Legacy transaction with a fixed gas limit and the configured gas price.
    pub fn into_request(self, from: Address, chain_id: u64, gas: &GasConfig) -> TransactionRequest {
        let (to, value, input, gas_limit) = match self {
            LedgerCall::Transfer { to, value } => (to, value, Vec::new(), gas.limit_transfer()),
            LedgerCall::Deposit { token, value } => (
                token,
                value,
                IWrappedNative::depositCall {}.abi_encode(),
                gas.limit_deposit(),
            ),
            LedgerCall::Withdraw { token, amount } => (
                token,
                U256::ZERO,
                IWrappedNative::withdrawCall { amount }.abi_encode(),
                gas.limit_withdraw(),
            ),
            LedgerCall::Approve {
                token,
                spender,
                amount,
            } => (
                token,
                U256::ZERO,
                IWrappedNative::approveCall { spender, amount }.abi_encode(),
                gas.limit_approve(),
            ),
        };

        let mut tx = TransactionRequest::default()
            .from(from)
            .to(to)
            .value(value)
            .input(input.into())
            .gas_limit(gas_limit);
        tx.gas_price = Some(gas.gas_price_wei as u128);
        tx.chain_id = Some(chain_id);
        tx
    }
}

/// Raw chain access for one wallet.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    fn address(&self) -> Address;

    async fn native_balance(&self) -> Result<U256>;

    async fn token_balance(&self, token: Address) -> Result<U256>;

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256>;

    /// Submit `call` and wait for a successful receipt.
    ///
    /// A reverted receipt is an error.
    async fn submit(&self, call: LedgerCall) -> Result<TxHash>;
}

/// JSON-RPC backend over an alloy provider with a local signer.
#[derive(Clone)]
pub struct AlloyBackend {
    provider: Arc<dyn Provider + Send + Sync>,
    address: Address,
    chain_id: u64,
    gas: GasConfig,
}

impl AlloyBackend {
    /// Build the provider, optionally routed through `proxy`, and check that
    /// the endpoint answers with the expected chain id.
    pub async fn connect(
        rpc_url: &str,
        signer: PrivateKeySigner,
        proxy: Option<&str>,
        chain_id: u64,
        gas: GasConfig,
    ) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(30));
        builder = match proxy {
            Some(proxy_url) => builder.proxy(Proxy::all(proxy_url).context("Invalid proxy URL")?),
            None => builder.no_proxy(),
        };
        let reqwest_client = builder.build().context("Failed to build HTTP client")?;

        let http_transport = Http::with_client(
            reqwest_client,
            rpc_url.parse::<Url>().context("Invalid RPC URL")?,
        );

        let client = ClientBuilder::default()
            .layer(alloy::transports::layers::RetryBackoffLayer::new(
                5, 100, 2000,
            ))
            .transport(http_transport, false);

        let address = signer.address();
        let provider: Arc<dyn Provider + Send + Sync> = Arc::new(
            alloy::providers::ProviderBuilder::new()
                .wallet(signer)
                .connect_client(client),
        );

        let remote_chain_id = provider
            .get_chain_id()
            .await
            .context("RPC endpoint did not answer eth_chainId")?;
        if remote_chain_id != chain_id {
            anyhow::bail!(
                "RPC reports chain id {} but {} is configured",
                remote_chain_id,
                chain_id
            );
        }

        Ok(Self {
            provider,
            address,
            chain_id,
            gas,
        })
    }
}

#[async_trait]
impl ChainBackend for AlloyBackend {
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        self.provider
            .get_balance(self.address)
            .await
            .context("Failed to read native balance")
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        let call = IWrappedNative::balanceOfCall {
            owner: self.address,
        };
        let data = self
            .provider
            .call(
                TransactionRequest::default()
                    .to(token)
                    .input(call.abi_encode().into()),
            )
            .await
            .context("balanceOf call failed")?;
        IWrappedNative::balanceOfCall::abi_decode_returns(&data).context("Bad balanceOf return")
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256> {
        let call = IWrappedNative::allowanceCall {
            owner: self.address,
            spender,
        };
        let data = self
            .provider
            .call(
                TransactionRequest::default()
                    .to(token)
                    .input(call.abi_encode().into()),
            )
            .await
            .context("allowance call failed")?;
        IWrappedNative::allowanceCall::abi_decode_returns(&data).context("Bad allowance return")
    }

    async fn submit(&self, call: LedgerCall) -> Result<TxHash> {
        let label = call.label();
        let tx = call.into_request(self.address, self.chain_id, &self.gas);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .with_context(|| format!("Failed to send {}", label))?;
        let tx_hash = *pending.tx_hash();
        debug!("{} submitted: {:?}", label, tx_hash);

        let receipt = pending
            .get_receipt()
            .await
            .with_context(|| format!("Failed to get {} receipt", label))?;
        if !receipt.status() {
            anyhow::bail!("{} reverted: {:?}", label, tx_hash);
        }
        Ok(tx_hash)
    }
}

/// Balance-aware ledger operations for one wallet.
pub struct LedgerClient<B> {
    backend: B,
    wrapped_token: Address,
    gas_buffer: U256,
}

impl<B: ChainBackend> LedgerClient<B> {
    pub fn new(backend: B, wrapped_token: Address, gas: &GasConfig) -> Self {
        Self {
            backend,
            wrapped_token,
            gas_buffer: U256::from(gas.buffer_wei),
        }
    }

    pub fn address(&self) -> Address {
        self.backend.address()
    }

    /// Native and wrapped balances, read concurrently.
    pub async fn balances(&self) -> Result<BalanceSnapshot> {
        let (native, wrapped) = tokio::try_join!(
            self.backend.native_balance(),
            self.backend.token_balance(self.wrapped_token)
        )?;
        Ok(BalanceSnapshot { native, wrapped })
    }

    /// Value to send for a native-funded operation, or `None` when the
    /// balance cannot cover it plus the fee buffer.
    fn native_value(&self, native: U256, amount: &Amount) -> Option<U256> {
        match amount {
            Amount::All => {
                let spendable = native.saturating_sub(self.gas_buffer);
                (!spendable.is_zero()).then_some(spendable)
            }
            Amount::Exact(d) => {
                let value = d.to_wei();
                (native >= value.saturating_add(self.gas_buffer)).then_some(value)
            }
        }
    }

    pub async fn transfer(&self, to: Address, amount: &Amount) -> Result<OperationOutcome> {
        let balances = self.balances().await?;
        let Some(value) = self.native_value(balances.native, amount) else {
            warn!(
                "Insufficient native balance for transfer: {} < {}",
                balances.native_formatted(),
                amount
            );
            return Ok(OperationOutcome::failure(
                OperationKind::Transfer,
                format!("Insufficient funds: {} available", balances.native_formatted()),
            ));
        };

        let tx_hash = self.backend.submit(LedgerCall::Transfer { to, value }).await?;
        Ok(OperationOutcome::success(
            OperationKind::Transfer,
            format!("Sent to {}", to),
        )
        .with_amount(format_ether(value))
        .with_tx_hash(format!("{:?}", tx_hash)))
    }

    pub async fn wrap_deposit(&self, amount: &Amount) -> Result<OperationOutcome> {
        let balances = self.balances().await?;
        let Some(value) = self.native_value(balances.native, amount) else {
            warn!(
                "Insufficient native balance for wrap: {} < {}",
                balances.native_formatted(),
                amount
            );
            return Ok(OperationOutcome::failure(
                OperationKind::Wrap,
                format!("Insufficient funds: {} available", balances.native_formatted()),
            ));
        };

        let tx_hash = self
            .backend
            .submit(LedgerCall::Deposit {
                token: self.wrapped_token,
                value,
            })
            .await?;
        Ok(OperationOutcome::success(OperationKind::Wrap, "Wrapped")
            .with_amount(format_ether(value))
            .with_tx_hash(format!("{:?}", tx_hash)))
    }

    /// Unwrap for iteration `index` of `total`.
    ///
    /// The last iteration always withdraws the whole wrapped balance. Other
    /// iterations use `requested`, clamped to the balance.
    pub async fn unwrap_withdraw(
        &self,
        index: u32,
        total: u32,
        requested: &Amount,
    ) -> Result<OperationOutcome> {
        let balances = self.balances().await?;
        if balances.wrapped.is_zero() {
            warn!("No wrapped balance to unwrap");
            return Ok(OperationOutcome::failure(
                OperationKind::Unwrap,
                "Nothing to unwrap",
            ));
        }

        let is_last = index + 1 == total;
        let amount = match requested {
            _ if is_last => {
                info!(
                    "Final unwrap, withdrawing entire balance {}",
                    balances.wrapped_formatted()
                );
                balances.wrapped
            }
            Amount::All => balances.wrapped,
            Amount::Exact(d) => {
                let wanted = d.to_wei();
                if wanted > balances.wrapped {
                    info!(
                        "Requested {} exceeds balance, unwrapping remaining {}",
                        d,
                        balances.wrapped_formatted()
                    );
                    balances.wrapped
                } else {
                    wanted
                }
            }
        };

        let allowance = self
            .backend
            .allowance(self.wrapped_token, self.wrapped_token)
            .await?;
        if allowance < amount {
            info!("Approving wrapped token for unwrapping...");
            self.approve(self.wrapped_token, U256::MAX).await?;
        }

        let tx_hash = self
            .backend
            .submit(LedgerCall::Withdraw {
                token: self.wrapped_token,
                amount,
            })
            .await?;
        Ok(OperationOutcome::success(OperationKind::Unwrap, "Unwrapped")
            .with_amount(format_ether(amount))
            .with_tx_hash(format!("{:?}", tx_hash)))
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<TxHash> {
        self.backend
            .submit(LedgerCall::Approve {
                token: self.wrapped_token,
                spender,
                amount,
            })
            .await
    }
}
