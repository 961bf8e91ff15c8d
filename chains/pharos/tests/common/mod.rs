#![allow(dead_code)]

use alloy::primitives::{address, Address, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{GasConfig, NetworkError, RetryPolicy, WalletSecret};
use pharos_bot::{
    ApiMethod, ApiTransport, ChainBackend, LedgerCall, LedgerClient, ServiceClient,
    SessionFactory, WalletIdentity, WalletSession,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

pub const WPHRS: Address = address!("76aaada469d23216be5f7c596fa25f282ff9b364");
pub const TARGET: Address = address!("90f79bf6eb2c4f870365e785982e1f101e93b906");

pub const KEY_1: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
pub const KEY_2: &str = "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}

pub fn identity(index: usize, key: &str) -> WalletIdentity {
    let secret = WalletSecret::parse(index, key).unwrap();
    WalletIdentity::from_secret(secret, 688688).unwrap()
}

pub fn signer(key: &str) -> PrivateKeySigner {
    key.parse().unwrap()
}

// --- Chain ---

#[derive(Debug, Default)]
pub struct ChainState {
    pub native: U256,
    pub wrapped: U256,
    pub allowance: U256,
    pub calls: Vec<LedgerCall>,
    pub submit_attempts: u32,
    /// Submissions that fail before anything is recorded.
    pub fail_submits: u32,
}

/// In-memory chain that applies submitted calls to its balances.
#[derive(Clone)]
pub struct FakeChain {
    address: Address,
    pub state: Arc<Mutex<ChainState>>,
}

impl FakeChain {
    pub fn new(address: Address, native: U256, wrapped: U256) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(ChainState {
                native,
                wrapped,
                ..Default::default()
            })),
        }
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn set_allowance(&self, allowance: U256) {
        self.state.lock().unwrap().allowance = allowance;
    }

    pub fn fail_next(&self, n: u32) {
        self.state.lock().unwrap().fail_submits = n;
    }
}

#[async_trait]
impl ChainBackend for FakeChain {
    fn address(&self) -> Address {
        self.address
    }

    async fn native_balance(&self) -> Result<U256> {
        Ok(self.state.lock().unwrap().native)
    }

    async fn token_balance(&self, _token: Address) -> Result<U256> {
        Ok(self.state.lock().unwrap().wrapped)
    }

    async fn allowance(&self, _token: Address, _spender: Address) -> Result<U256> {
        Ok(self.state.lock().unwrap().allowance)
    }

    async fn submit(&self, call: LedgerCall) -> Result<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.submit_attempts += 1;
        if state.fail_submits > 0 {
            state.fail_submits -= 1;
            anyhow::bail!("{} reverted", call.label());
        }

        match call {
            LedgerCall::Transfer { value, .. } => state.native -= value,
            LedgerCall::Deposit { value, .. } => {
                state.native -= value;
                state.wrapped += value;
            }
            LedgerCall::Withdraw { amount, .. } => {
                state.wrapped -= amount;
                state.native += amount;
            }
            LedgerCall::Approve { amount, .. } => state.allowance = amount,
        }
        state.calls.push(call);
        Ok(TxHash::with_last_byte(state.calls.len() as u8))
    }
}

pub fn ledger(chain: &FakeChain) -> LedgerClient<FakeChain> {
    LedgerClient::new(chain.clone(), WPHRS, &GasConfig::default())
}

// --- API ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: ApiMethod,
    pub endpoint: String,
    pub bearer: Option<String>,
}

#[derive(Default)]
struct ApiState {
    scripted: HashMap<String, VecDeque<Result<Value, NetworkError>>>,
    defaults: HashMap<String, Value>,
    hanging: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

/// Scripted REST backend keyed by endpoint path.
///
/// Scripted responses are consumed in order; once an endpoint's script
/// runs dry its default response is returned.
#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<ApiState>>,
}

impl FakeApi {
    /// Every endpoint answers successfully and the faucet is claimable.
    pub fn healthy() -> Self {
        let api = Self::default();
        api.respond("/user/login", json!({"code": 0, "data": {"jwt": "tok-1"}}));
        api.respond(
            "/faucet/status",
            json!({"code": 0, "data": {"is_able_to_faucet": true}}),
        );
        api.respond("/faucet/daily", json!({"code": 0, "msg": "ok"}));
        api.respond("/sign/in", json!({"code": 0, "msg": "ok"}));
        api
    }

    pub fn respond(&self, endpoint: &str, body: Value) {
        self.state
            .lock()
            .unwrap()
            .defaults
            .insert(endpoint.to_string(), body);
    }

    pub fn script(&self, endpoint: &str, response: Result<Value, NetworkError>) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
    }

    /// Requests to `endpoint` are recorded but never answered.
    pub fn hang(&self, endpoint: &str) {
        self.state
            .lock()
            .unwrap()
            .hanging
            .insert(endpoint.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, endpoint: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .count()
    }
}

#[async_trait]
impl ApiTransport for FakeApi {
    async fn request(
        &self,
        method: ApiMethod,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<Value, NetworkError> {
        let endpoint = path.split('?').next().unwrap_or(path).to_string();
        let hangs = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(RecordedRequest {
                method,
                endpoint: endpoint.clone(),
                bearer: bearer.map(str::to_string),
            });
            state.hanging.contains(&endpoint)
        };
        if hangs {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        if let Some(response) = state
            .scripted
            .get_mut(&endpoint)
            .and_then(|queue| queue.pop_front())
        {
            return response;
        }
        state
            .defaults
            .get(&endpoint)
            .cloned()
            .ok_or(NetworkError::HttpStatus {
                status_code: 404,
                endpoint,
                body: "not found".to_string(),
            })
    }
}

pub fn service(api: &FakeApi, key: &str) -> ServiceClient<FakeApi> {
    ServiceClient::new(api.clone(), signer(key), "TESTCODE", RetryPolicy::linear(3, 2000))
}

// --- Sessions ---

#[derive(Default)]
struct FactoryState {
    chains: Vec<(Address, FakeChain)>,
    relays: Vec<Option<String>>,
}

/// Opens sessions against fresh fake chains sharing one fake API.
#[derive(Clone)]
pub struct FakeFactory {
    pub api: FakeApi,
    native: U256,
    /// Relays for which opening a session fails.
    failing_relays: Vec<String>,
    /// Wallet indices for which opening a session fails.
    failing_wallets: Vec<usize>,
    state: Arc<Mutex<FactoryState>>,
}

impl FakeFactory {
    pub fn new(api: FakeApi, native: U256) -> Self {
        Self {
            api,
            native,
            failing_relays: Vec::new(),
            failing_wallets: Vec::new(),
            state: Arc::new(Mutex::new(FactoryState::default())),
        }
    }

    pub fn failing_wallet(mut self, index: usize) -> Self {
        self.failing_wallets.push(index);
        self
    }

    pub fn failing_relay(mut self, uri: &str) -> Self {
        self.failing_relays.push(uri.to_string());
        self
    }

    pub fn chain(&self, address: Address) -> Option<FakeChain> {
        self.state
            .lock()
            .unwrap()
            .chains
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, c)| c.clone())
    }

    pub fn relays_used(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().relays.clone()
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Backend = FakeChain;
    type Transport = FakeApi;

    async fn open(
        &self,
        wallet: &WalletIdentity,
        relay: Option<&str>,
    ) -> Result<WalletSession<FakeChain, FakeApi>> {
        self.state
            .lock()
            .unwrap()
            .relays
            .push(relay.map(str::to_string));

        if self.failing_wallets.contains(&wallet.index()) {
            anyhow::bail!("RPC endpoint did not answer eth_chainId");
        }
        if relay.is_some_and(|r| self.failing_relays.iter().any(|f| f == r)) {
            anyhow::bail!("proxy refused connection");
        }

        let chain = FakeChain::new(wallet.address(), self.native, U256::ZERO);
        self.state
            .lock()
            .unwrap()
            .chains
            .push((wallet.address(), chain.clone()));

        Ok(WalletSession {
            ledger: ledger(&chain),
            service: ServiceClient::new(
                self.api.clone(),
                wallet.signer().clone(),
                "TESTCODE",
                RetryPolicy::linear(3, 2000),
            ),
        })
    }
}
