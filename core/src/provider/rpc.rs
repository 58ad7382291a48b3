//! Remote wallet provider over EIP-1193 style JSON-RPC.
//!
//! A plain HTTP bridge cannot push `accountsChanged` / `chainChanged`, so the
//! subscription polls `eth_accounts` and `eth_chainId` and emits the diff.
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{hex, Address, TxHash};
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ContractCall, ProviderError, ProviderEvent, ProviderKind, Receipt, WalletProvider};
use crate::address::to_lower_hex;
use crate::config::{validate_url, ViewerConfig};

/// EIP-1193 "User Rejected Request".
const USER_REJECTED_CODE: i64 = 4001;
/// Consecutive poll failures before the bridge is reported as disconnected.
const MAX_POLL_FAILURES: u32 = 3;
const EVENT_BUFFER: usize = 16;

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("HTTP status {status}")));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(err) = body.error {
            if err.code == USER_REJECTED_CODE {
                return Err(ProviderError::UserRejected);
            }
            return Err(ProviderError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(body.result.unwrap_or(Value::Null))
    }

    async fn accounts(&self, method: &str) -> Result<Vec<Address>, ProviderError> {
        let result = self.call(method, json!([])).await?;
        parse_accounts(&result)
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let result = self.call("eth_chainId", json!([])).await?;
        result
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| malformed("eth_chainId", &result))
    }
}

pub struct RpcWalletProvider {
    rpc: Arc<RpcClient>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl RpcWalletProvider {
    pub fn new(config: &ViewerConfig) -> anyhow::Result<Self> {
        validate_url(&config.provider_url, config.allow_insecure)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            rpc: Arc::new(RpcClient {
                http,
                url: config.provider_url.clone(),
                next_id: AtomicU64::new(1),
            }),
            poll_interval: config.poll_interval(),
            confirmation_timeout: config.confirmation_timeout(),
            poller: Mutex::new(None),
        })
    }

    fn replace_poller(&self, next: Option<JoinHandle<()>>) {
        if let Ok(mut slot) = self.poller.lock() {
            if let Some(previous) = std::mem::replace(&mut *slot, next) {
                previous.abort();
            }
        }
    }

    async fn fetch_receipt(&self, tx: TxHash) -> Result<Option<Receipt>, ProviderError> {
        let result = self
            .rpc
            .call(
                "eth_getTransactionReceipt",
                json!([format!("0x{}", hex::encode(tx.as_slice()))]),
            )
            .await?;
        parse_receipt(tx, &result)
    }

    async fn poll_receipt(&self, tx: TxHash) -> Result<Receipt, ProviderError> {
        loop {
            if let Some(receipt) = self.fetch_receipt(tx).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

impl Drop for RpcWalletProvider {
    fn drop(&mut self) {
        self.replace_poller(None);
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Remote
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.rpc.accounts("eth_requestAccounts").await
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        self.rpc.chain_id().await
    }

    async fn signer_address(&self) -> Result<Address, ProviderError> {
        self.rpc
            .accounts("eth_accounts")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Unavailable("no account exposed by provider".into()))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<ProviderEvent>, ProviderError> {
        let accounts = self.rpc.accounts("eth_accounts").await?;
        let chain_id = self.rpc.chain_id().await?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(poll_events(
            Arc::clone(&self.rpc),
            self.poll_interval,
            tx,
            Snapshot { accounts, chain_id },
        ));
        self.replace_poller(Some(handle));
        Ok(rx)
    }

    fn unsubscribe(&self) {
        self.replace_poller(None);
    }

    async fn release_accounts(&self) -> Result<(), ProviderError> {
        self.rpc
            .call("wallet_requestPermissions", json!([{ "eth_accounts": {} }]))
            .await
            .map(|_| ())
    }

    async fn submit_contract_call(&self, call: ContractCall) -> Result<TxHash, ProviderError> {
        let tx = json!({
            "from": to_lower_hex(&call.from),
            "to": to_lower_hex(&call.to),
            "data": format!("0x{}", hex::encode(&call.data)),
        });
        let result = self.rpc.call("eth_sendTransaction", json!([tx])).await?;
        result
            .as_str()
            .and_then(|s| TxHash::from_str(s).ok())
            .ok_or_else(|| malformed("eth_sendTransaction", &result))
    }

    async fn await_confirmation(&self, tx: TxHash) -> Result<Receipt, ProviderError> {
        match tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(tx)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::TransactionFailed(format!(
                "{tx} not confirmed within {}s",
                self.confirmation_timeout.as_secs()
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    accounts: Vec<Address>,
    chain_id: u64,
}

/// Events implied by moving from `prev` to `next`; chain first, the viewer
/// restarts on it anyway.
fn diff_snapshot(prev: &Snapshot, next: &Snapshot) -> Vec<ProviderEvent> {
    let mut events = Vec::new();
    if prev.chain_id != next.chain_id {
        events.push(ProviderEvent::ChainChanged(next.chain_id));
    }
    if prev.accounts != next.accounts {
        events.push(ProviderEvent::AccountsChanged(next.accounts.clone()));
    }
    events
}

async fn poll_events(
    rpc: Arc<RpcClient>,
    interval: Duration,
    tx: mpsc::Sender<ProviderEvent>,
    mut last: Snapshot,
) {
    let mut failures = 0u32;
    loop {
        tokio::time::sleep(interval).await;
        if tx.is_closed() {
            break;
        }

        let polled = async {
            let accounts = rpc.accounts("eth_accounts").await?;
            let chain_id = rpc.chain_id().await?;
            Ok::<_, ProviderError>(Snapshot { accounts, chain_id })
        }
        .await;

        match polled {
            Ok(next) => {
                failures = 0;
                for event in diff_snapshot(&last, &next) {
                    debug!(?event, "provider event");
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                last = next;
            }
            Err(e) => {
                failures += 1;
                warn!(error = %e, failures, "provider poll failed");
                if failures >= MAX_POLL_FAILURES {
                    let _ = tx.send(ProviderEvent::Disconnected(e.to_string())).await;
                    return;
                }
            }
        }
    }
}

fn malformed(method: &str, value: &Value) -> ProviderError {
    ProviderError::Rpc {
        code: -32603,
        message: format!("unexpected {method} result: {value}"),
    }
}

fn parse_quantity(s: &str) -> Option<u64> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

fn parse_accounts(value: &Value) -> Result<Vec<Address>, ProviderError> {
    let list = value
        .as_array()
        .ok_or_else(|| malformed("accounts", value))?;
    list.iter()
        .map(|v| {
            v.as_str()
                .and_then(|s| Address::from_str(s).ok())
                .ok_or_else(|| malformed("accounts", v))
        })
        .collect()
}

/// `None` while pending. Status `0x0` is a revert.
fn parse_receipt(tx: TxHash, value: &Value) -> Result<Option<Receipt>, ProviderError> {
    if value.is_null() {
        return Ok(None);
    }
    let status = value
        .get("status")
        .and_then(|v| v.as_str())
        .and_then(parse_quantity);
    if status == Some(0) {
        return Err(ProviderError::TransactionReverted(tx));
    }
    let block_number = value
        .get("blockNumber")
        .and_then(|v| v.as_str())
        .and_then(parse_quantity);
    Ok(Some(Receipt {
        transaction_hash: tx,
        block_number,
    }))
}
