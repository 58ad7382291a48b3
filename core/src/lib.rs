pub mod address;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod indexer;
pub mod provider;
pub mod session;
pub mod signer;
pub mod transfer;

pub use commands::{Command, ExecContext};
pub use config::ViewerConfig;
pub use error::{FetchFailure, ViewerError};
pub use indexer::{BalanceDataSource, IndexerClient, NativeBalance, TokenItem, TokenStandard};
pub use provider::{ProviderEvent, ProviderKind, RpcWalletProvider, WalletProvider};
pub use session::{
    ConnectionSession, ConnectionState, DisplayState, RefreshHandle, RefreshOutcome, RegionState,
    SessionInfo, SessionNotice,
};
pub use signer::SignerHandle;
pub use transfer::{TransferOutcome, TransferRequest};

pub use alloy_primitives::{Address, TxHash, U256};
