use alloy_primitives::{Address, TxHash};
use serde::Serialize;

use crate::error::FetchFailure;
use crate::indexer::{NativeBalance, TokenItem};
use crate::provider::ProviderKind;
use crate::signer::SignerHandle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// The live connection. Exists only while `ConnectionState::Connected`.
#[derive(Debug, Clone)]
pub(crate) struct Session {
    pub address: Address,
    pub provider_kind: ProviderKind,
    pub signer: SignerHandle,
}

/// Public view of the live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub address: Address,
    pub provider_kind: ProviderKind,
}

impl Session {
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            address: self.address,
            provider_kind: self.provider_kind,
        }
    }
}

/// One independently loaded display region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RegionState<T> {
    /// Nothing requested since the last teardown.
    #[default]
    Empty,
    Loading,
    Loaded(T),
    Failed(FetchFailure),
}

impl<T> RegionState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Everything the viewer renders. Reset to `Default` on teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayState {
    /// Lowercase hex of the account the regions belong to.
    pub address: Option<String>,
    pub native: RegionState<NativeBalance>,
    pub erc721: RegionState<Vec<TokenItem>>,
    pub erc1155: RegionState<Vec<TokenItem>>,
}

impl DisplayState {
    pub fn is_loading(&self) -> bool {
        self.native.is_loading() || self.erc721.is_loading() || self.erc1155.is_loading()
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }

    /// Balance shown for an ERC-1155 item, used as the transfer ceiling.
    pub fn erc1155_balance(&self, contract: &str, token_id: &str) -> Option<&str> {
        self.erc1155
            .loaded()?
            .iter()
            .find(|item| {
                item.contract_address.eq_ignore_ascii_case(contract) && item.token_id == token_id
            })
            .and_then(|item| item.balance.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    UserRequested,
    AccountsCleared,
    ProviderDisconnected(String),
    ChainChanged(u64),
    HandshakeFailed(String),
}

impl std::fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequested => write!(f, "disconnected by user"),
            Self::AccountsCleared => write!(f, "wallet revoked account access"),
            Self::ProviderDisconnected(reason) => write!(f, "provider disconnected: {reason}"),
            Self::ChainChanged(chain_id) => write!(f, "chain changed to {chain_id}"),
            Self::HandshakeFailed(reason) => write!(f, "connection attempt failed: {reason}"),
        }
    }
}

/// Lifecycle notifications for the embedding application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionNotice {
    Connected(Address),
    AccountSwitched(Address),
    Disconnected(DisconnectReason),
    /// The chain changed under the session; the host should rebuild its view.
    ReloadRequired { chain_id: u64 },
    TransferConfirmed(TxHash),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(contract: &str, id: &str, balance: &str) -> TokenItem {
        TokenItem {
            contract_address: contract.into(),
            token_id: id.into(),
            balance: Some(balance.into()),
            metadata: Default::default(),
        }
    }

    #[test]
    fn default_display_is_cleared() {
        let display = DisplayState::default();
        assert!(display.is_cleared());
        assert!(!display.is_loading());
    }

    #[test]
    fn loading_any_region_is_loading() {
        let display = DisplayState {
            erc721: RegionState::Loading,
            ..Default::default()
        };
        assert!(display.is_loading());
        assert!(!display.is_cleared());
    }

    #[test]
    fn erc1155_balance_lookup() {
        let display = DisplayState {
            erc1155: RegionState::Loaded(vec![item("0xabc", "1", "4"), item("0xabc", "2", "9")]),
            ..Default::default()
        };
        assert_eq!(display.erc1155_balance("0xABC", "2"), Some("9"));
        assert_eq!(display.erc1155_balance("0xabc", "3"), None);
    }
}
