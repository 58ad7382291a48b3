//! In-process fakes for the wallet provider and the indexing API.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use somnia_viewer_core::indexer::{BalanceDataSource, NativeBalance, TokenItem, TokenMetadata};
use somnia_viewer_core::provider::{
    ContractCall, ProviderError, ProviderEvent, ProviderKind, Receipt, WalletProvider,
};
use somnia_viewer_core::{Address, FetchFailure, TxHash, ViewerConfig};
use tokio::sync::{mpsc, oneshot};

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn config() -> ViewerConfig {
    ViewerConfig {
        expected_chain_id: None,
        ..Default::default()
    }
}

pub fn erc1155(contract: &str, token_id: &str, balance: &str) -> TokenItem {
    TokenItem {
        contract_address: contract.to_string(),
        token_id: token_id.to_string(),
        balance: Some(balance.to_string()),
        metadata: TokenMetadata {
            name: Some(format!("Token {token_id}")),
            ..Default::default()
        },
    }
}

type Answer<T> = Result<T, FetchFailure>;

#[derive(Clone)]
pub struct Holdings {
    pub native: Answer<NativeBalance>,
    pub erc721: Answer<Vec<TokenItem>>,
    pub erc1155: Answer<Vec<TokenItem>>,
}

impl Holdings {
    pub fn balance(balance: &str) -> Self {
        Self {
            native: Ok(NativeBalance {
                balance: balance.to_string(),
            }),
            erc721: Ok(Vec::new()),
            erc1155: Ok(Vec::new()),
        }
    }

    pub fn with_erc1155(mut self, items: Vec<TokenItem>) -> Self {
        self.erc1155 = Ok(items);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Native,
    Erc721,
    Erc1155,
}

/// Data source answering from a per-address table. A gated region blocks
/// until its `oneshot` sender fires or is dropped.
#[derive(Default)]
pub struct FakeSource {
    holdings: Mutex<HashMap<Address, Holdings>>,
    gates: Mutex<HashMap<(Address, Region), oneshot::Receiver<()>>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, address: Address, holdings: Holdings) {
        self.holdings.lock().unwrap().insert(address, holdings);
    }

    pub fn gate(&self, address: Address, region: Region) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert((address, region), rx);
        tx
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn answer(&self, address: &Address, region: Region) -> Holdings {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&(*address, region));
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        let holdings = self.holdings.lock().unwrap().get(address).cloned();
        holdings.unwrap_or(Holdings {
            native: Err(FetchFailure::Status(404)),
            erc721: Err(FetchFailure::Status(404)),
            erc1155: Err(FetchFailure::Status(404)),
        })
    }
}

#[async_trait]
impl BalanceDataSource for FakeSource {
    async fn native_balance(&self, address: &Address) -> Result<NativeBalance, FetchFailure> {
        self.answer(address, Region::Native).await.native
    }

    async fn erc721_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure> {
        self.answer(address, Region::Erc721).await.erc721
    }

    async fn erc1155_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure> {
        self.answer(address, Region::Erc1155).await.erc1155
    }
}

pub const TX: TxHash = TxHash::repeat_byte(0xab);

/// Wallet provider with scripted accounts and a manual event channel.
pub struct FakeProvider {
    accounts: Mutex<Vec<Address>>,
    accounts_delay: Mutex<Duration>,
    reject: AtomicBool,
    chain: AtomicU64,
    revert: AtomicBool,
    events: Mutex<Option<mpsc::Sender<ProviderEvent>>>,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    releases: AtomicUsize,
    submitted: Mutex<Vec<ContractCall>>,
}

impl FakeProvider {
    pub fn new(accounts: Vec<Address>) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(accounts),
            accounts_delay: Mutex::new(Duration::ZERO),
            reject: AtomicBool::new(false),
            chain: AtomicU64::new(50312),
            revert: AtomicBool::new(false),
            events: Mutex::new(None),
            subscribes: AtomicUsize::new(0),
            unsubscribes: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        })
    }

    pub fn set_chain(&self, chain_id: u64) {
        self.chain.store(chain_id, Ordering::SeqCst);
    }

    /// Make `request_accounts` wait, like a wallet awaiting user approval.
    pub fn delay_accounts(&self, delay: Duration) {
        *self.accounts_delay.lock().unwrap() = delay;
    }

    pub fn reject_requests(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }

    pub fn revert_transactions(&self) {
        self.revert.store(true, Ordering::SeqCst);
    }

    pub fn subscribes(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.events.lock().unwrap().is_some()
    }

    pub fn submitted(&self) -> Vec<ContractCall> {
        self.submitted.lock().unwrap().clone()
    }

    /// Push an event through the live subscription, if any.
    pub async fn emit(&self, event: ProviderEvent) -> bool {
        let tx = self.events.lock().unwrap().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Injected
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let delay = *self.accounts_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(ProviderError::UserRejected);
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        Ok(self.chain.load(Ordering::SeqCst))
    }

    async fn signer_address(&self) -> Result<Address, ProviderError> {
        let accounts = self.accounts.lock().unwrap().clone();
        accounts
            .first()
            .copied()
            .ok_or_else(|| ProviderError::Unavailable("no accounts".into()))
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<ProviderEvent>, ProviderError> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(8);
        *self.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn unsubscribe(&self) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        self.events.lock().unwrap().take();
    }

    async fn release_accounts(&self) -> Result<(), ProviderError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(ProviderError::UserRejected);
        }
        Ok(())
    }

    async fn submit_contract_call(&self, call: ContractCall) -> Result<TxHash, ProviderError> {
        self.submitted.lock().unwrap().push(call);
        Ok(TX)
    }

    async fn await_confirmation(&self, tx: TxHash) -> Result<Receipt, ProviderError> {
        if self.revert.load(Ordering::SeqCst) {
            return Err(ProviderError::TransactionReverted(tx));
        }
        Ok(Receipt {
            transaction_hash: tx,
            block_number: Some(42),
        })
    }
}
