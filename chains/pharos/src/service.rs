//! Off-chain REST client: signature login, faucet claim and daily check-in.
//!
//! Every response is wrapped in `{code, data?, msg?}`. [`decode`] turns that
//! envelope into an [`ApiResult`] using strict serde types per endpoint.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use core_logic::{with_retry_if, NetworkError, OperationKind, OperationOutcome, RetryPolicy};
use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION, ORIGIN, REFERER, USER_AGENT,
};
use reqwest::{Client, Proxy};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

/// Fixed message signed at login.
pub const LOGIN_CHALLENGE: &str = "pharos";

const SITE_ORIGIN: &str = "https://testnet.pharosnetwork.xyz";

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
}

/// One HTTP round trip. Non-2xx statuses come back as
/// [`NetworkError::HttpStatus`]; retries happen above this layer.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn request(
        &self,
        method: ApiMethod,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<Value, NetworkError>;
}

/// reqwest transport with browser-like headers, optionally via a relay.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, proxy: Option<&str>, timeout: Duration) -> Result<Self, NetworkError> {
        let request_error = |reason: String| NetworkError::Request {
            endpoint: base_url.to_string(),
            reason,
        };

        let mut builder = Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers());
        builder = match proxy {
            Some(proxy_url) => {
                builder.proxy(Proxy::all(proxy_url).map_err(|e| request_error(e.to_string()))?)
            }
            // Direct means direct: ignore HTTP(S)_PROXY from the environment
            None => builder.no_proxy(),
        };
        let client = builder.build().map_err(|e| request_error(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    headers.insert(ORIGIN, HeaderValue::from_static(SITE_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static("https://testnet.pharosnetwork.xyz/"));
    let agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));
    headers
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn request(
        &self,
        method: ApiMethod,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<Value, NetworkError> {
        let url = format!("{}{}", self.base_url, path);
        let endpoint = path.split('?').next().unwrap_or(path).to_string();

        let mut request = match method {
            ApiMethod::Get => self.client.get(&url),
            ApiMethod::Post => self.client.post(&url),
        };
        if let Some(token) = bearer {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        debug!("{:?} {}", method, endpoint);
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                NetworkError::NoResponse {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                }
            } else {
                NetworkError::Request {
                    endpoint: endpoint.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpStatus {
                status_code: status.as_u16(),
                endpoint,
                body: body.chars().take(200).collect(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| NetworkError::InvalidResponse {
                endpoint,
                reason: e.to_string(),
            })
    }
}

/// Raw response envelope.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    pub code: i64,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Decoded outcome of one endpoint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult<T> {
    Success(T),
    Failure { code: i64, msg: String },
}

/// Decode `body` into the payload type of `endpoint`.
///
/// `code == 0` requires `data` to match `T` (use `()` for endpoints without
/// a payload); any other code is a [`ApiResult::Failure`].
pub fn decode<T: DeserializeOwned>(endpoint: &str, body: Value) -> Result<ApiResult<T>, NetworkError> {
    let invalid = |reason: String| NetworkError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason,
    };

    let envelope: ApiEnvelope = serde_json::from_value(body).map_err(|e| invalid(e.to_string()))?;
    if envelope.code != 0 {
        return Ok(ApiResult::Failure {
            code: envelope.code,
            msg: envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
        });
    }

    let data = envelope.data.unwrap_or(Value::Null);
    serde_json::from_value(data)
        .map(ApiResult::Success)
        .map_err(|e| invalid(e.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    #[serde(alias = "jwt")]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FaucetStatus {
    pub is_able_to_faucet: bool,
    #[serde(rename = "avaliable_timestamp", default)]
    pub available_timestamp: Option<i64>,
}

/// Bearer token for the off-chain service.
#[derive(Clone)]
pub struct SessionToken(Zeroizing<String>);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(SessionToken),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    fn token(&self) -> Option<&SessionToken> {
        match self {
            SessionState::Authenticated(token) => Some(token),
            SessionState::Unauthenticated => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Login failed: {0}")]
    LoginRejected(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Session-holding client for one wallet.
pub struct ServiceClient<T> {
    transport: T,
    signer: PrivateKeySigner,
    invite_code: String,
    policy: RetryPolicy,
    state: SessionState,
}

impl<T: ApiTransport> ServiceClient<T> {
    pub fn new(transport: T, signer: PrivateKeySigner, invite_code: &str, policy: RetryPolicy) -> Self {
        Self {
            transport,
            signer,
            invite_code: invite_code.to_string(),
            policy,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sign the login challenge and store the returned token.
    pub async fn login(&mut self) -> Result<(), ServiceError> {
        let signature = self
            .signer
            .sign_message(LOGIN_CHALLENGE.as_bytes())
            .await
            .map_err(|e| ServiceError::Signing(e.to_string()))?;
        let path = format!(
            "/user/login?address={}&signature=0x{}&invite_code={}",
            self.address(),
            hex::encode(signature.as_bytes()),
            self.invite_code
        );

        let body = self.send(ApiMethod::Post, &path).await?;
        match decode::<LoginData>("/user/login", body)? {
            ApiResult::Success(data) if !data.token.is_empty() => {
                self.state = SessionState::Authenticated(SessionToken::new(data.token));
                info!("Login Success");
                Ok(())
            }
            ApiResult::Success(_) => Err(ServiceError::LoginRejected("empty token".to_string())),
            ApiResult::Failure { msg, .. } => Err(ServiceError::LoginRejected(msg)),
        }
    }

    async fn ensure_authenticated(&mut self) -> Result<(), ServiceError> {
        if !self.state.is_authenticated() {
            self.login().await?;
        }
        Ok(())
    }

    /// Transport call under the linear retry policy; only transient
    /// failures are retried.
    async fn send(&self, method: ApiMethod, path: &str) -> Result<Value, NetworkError> {
        let bearer = self.state.token().map(|t| t.expose().to_string());
        let transport = &self.transport;
        let bearer = bearer.as_deref();
        with_retry_if(
            &self.policy,
            path.split('?').next().unwrap_or(path),
            || transport.request(method, path, bearer),
            NetworkError::is_transient,
        )
        .await
        .map_err(|e| e.into_last_error())
    }

    /// Authenticated call. A 401/403 drops the session, signs in again once
    /// and replays the request once.
    async fn call(&mut self, method: ApiMethod, path: &str) -> Result<Value, ServiceError> {
        self.ensure_authenticated().await?;
        match self.send(method, path).await {
            Err(e) if e.is_unauthorized() => {
                warn!("Session rejected ({}), signing in again", e);
                self.state = SessionState::Unauthenticated;
                self.login().await?;
                Ok(self.send(method, path).await?)
            }
            other => Ok(other?),
        }
    }

    pub async fn faucet_status(&mut self) -> Result<ApiResult<FaucetStatus>, ServiceError> {
        let path = format!("/faucet/status?address={}", self.address());
        let body = self.call(ApiMethod::Get, &path).await?;
        Ok(decode("/faucet/status", body)?)
    }

    pub async fn claim_faucet(&mut self) -> Result<OperationOutcome, ServiceError> {
        let status = match self.faucet_status().await? {
            ApiResult::Success(status) => status,
            ApiResult::Failure { msg, .. } => {
                return Ok(OperationOutcome::failure(
                    OperationKind::Faucet,
                    format!("Faucet status check failed: {}", msg),
                ))
            }
        };

        if !status.is_able_to_faucet {
            let next = status
                .available_timestamp
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            warn!("Faucet not available until {}", next);
            return Ok(OperationOutcome::failure(
                OperationKind::Faucet,
                format!("Not available until {}", next),
            ));
        }

        let path = format!("/faucet/daily?address={}", self.address());
        let body = self.call(ApiMethod::Post, &path).await?;
        Ok(match decode::<Value>("/faucet/daily", body)? {
            ApiResult::Success(_) => OperationOutcome::success(OperationKind::Faucet, "Faucet claimed"),
            ApiResult::Failure { msg, .. } => {
                OperationOutcome::failure(OperationKind::Faucet, format!("Claim failed: {}", msg))
            }
        })
    }

    /// Daily check-in. An "already checked in" answer counts as success.
    pub async fn daily_check_in(&mut self) -> Result<OperationOutcome, ServiceError> {
        let path = format!("/sign/in?address={}", self.address());
        let body = self.call(ApiMethod::Post, &path).await?;
        Ok(match decode::<Value>("/sign/in", body)? {
            ApiResult::Success(_) => OperationOutcome::success(OperationKind::Checkin, "Checked in"),
            ApiResult::Failure { msg, .. } if msg.to_lowercase().contains("already") => {
                info!("Already checked in today");
                OperationOutcome::success(OperationKind::Checkin, "Already checked in today")
            }
            ApiResult::Failure { msg, .. } => {
                OperationOutcome::failure(OperationKind::Checkin, format!("Check-in failed: {}", msg))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_login_accepts_jwt_alias() {
        let body = json!({"code": 0, "data": {"jwt": "abc"}});
        match decode::<LoginData>("/user/login", body).unwrap() {
            ApiResult::Success(data) => assert_eq!(data.token, "abc"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_decode_missing_payload_is_invalid() {
        let body = json!({"code": 0});
        let err = decode::<LoginData>("/user/login", body).unwrap_err();
        assert!(matches!(err, NetworkError::InvalidResponse { .. }));
    }

    #[test]
    fn test_decode_failure_code() {
        let body = json!({"code": 1, "msg": "already signed in today"});
        assert_eq!(
            decode::<Value>("/sign/in", body).unwrap(),
            ApiResult::Failure {
                code: 1,
                msg: "already signed in today".to_string()
            }
        );
    }

    #[test]
    fn test_decode_faucet_status_misspelled_field() {
        let body = json!({"code": 0, "data": {"is_able_to_faucet": false, "avaliable_timestamp": 1700000000}});
        match decode::<FaucetStatus>("/faucet/status", body).unwrap() {
            ApiResult::Success(status) => {
                assert!(!status.is_able_to_faucet);
                assert_eq!(status.available_timestamp, Some(1_700_000_000));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_token_debug_redacted() {
        assert_eq!(format!("{:?}", SessionToken::new("secret")), "SessionToken(***)");
    }
}
