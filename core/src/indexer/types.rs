use serde::Serialize;

/// Native balance as the decimal string reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeBalance {
    pub balance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenStandard {
    Erc721,
    Erc1155,
}

impl TokenStandard {
    /// Path segment and response key prefix used by the indexer.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Erc721 => "erc721",
            Self::Erc1155 => "erc1155",
        }
    }

    pub(super) fn list_key(&self) -> &'static str {
        match self {
            Self::Erc721 => "erc721TokenBalances",
            Self::Erc1155 => "erc1155TokenBalances",
        }
    }
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erc721 => write!(f, "ERC-721"),
            Self::Erc1155 => write!(f, "ERC-1155"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Raw URI as served; resolve with `display::resolve_image_uri` before fetching.
    pub image_uri: Option<String>,
    pub attributes: Option<String>,
}

/// One held token. `token_id` and `balance` stay decimal strings: ids
/// routinely exceed 64 bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenItem {
    pub contract_address: String,
    pub token_id: String,
    /// Held amount; `None` for ERC-721 listings.
    pub balance: Option<String>,
    pub metadata: TokenMetadata,
}
