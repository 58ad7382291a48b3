//! Wallet provider seam: account access, lifecycle events, and contract calls.
mod rpc;

pub use rpc::RpcWalletProvider;

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Where the provider lives relative to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Handed to the viewer directly by the host environment.
    Injected,
    /// Reached over a bridge (JSON-RPC endpoint, relay).
    Remote,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Injected => write!(f, "injected"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Lifecycle notifications emitted while subscribed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
    Disconnected(String),
}

/// A single-function contract call to be signed and submitted by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected by user")]
    UserRejected,

    #[error("provider error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("transaction {0} reverted")]
    TransactionReverted(TxHash),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Ask the wallet for account access. The first entry is the active account.
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn chain_id(&self) -> Result<u64, ProviderError>;

    /// Address the provider signs with.
    async fn signer_address(&self) -> Result<Address, ProviderError>;

    /// Start delivering lifecycle events. Replaces any previous subscription.
    async fn subscribe(&self) -> Result<mpsc::Receiver<ProviderEvent>, ProviderError>;

    /// Stop delivering events. Safe to call when not subscribed.
    fn unsubscribe(&self);

    /// Re-prompt the wallet for account permissions when the user
    /// disconnects. Providers without such a prompt do nothing.
    async fn release_accounts(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn submit_contract_call(&self, call: ContractCall) -> Result<TxHash, ProviderError>;

    /// Wait until the transaction is mined. Reverts are reported as errors.
    async fn await_confirmation(&self, tx: TxHash) -> Result<Receipt, ProviderError>;
}
