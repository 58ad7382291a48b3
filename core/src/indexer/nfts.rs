use alloy_primitives::Address;
use serde_json::Value;
use tracing::debug;

use super::types::{TokenItem, TokenMetadata, TokenStandard};
use super::{decimal_field, IndexerClient};
use crate::error::FetchFailure;

impl IndexerClient {
    /// Query one page of ERC-721 or ERC-1155 holdings for an address.
    pub(super) async fn token_balances(
        &self,
        address: &Address,
        standard: TokenStandard,
    ) -> Result<Vec<TokenItem>, FetchFailure> {
        let url = self.address_url(address, &format!("balance/{}", standard.slug()));
        let data = self
            .get_json(&url, &[("page-size", self.page_size.to_string())])
            .await?;
        parse_token_list(&data, standard)
    }
}

/// Parse a listing response. A missing or null list is an empty holding.
pub(super) fn parse_token_list(
    data: &Value,
    standard: TokenStandard,
) -> Result<Vec<TokenItem>, FetchFailure> {
    let nodes = match data.get(standard.list_key()) {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(nodes)) => nodes,
        Some(_) => {
            return Err(FetchFailure::Decode(format!(
                "'{}' is not a list",
                standard.list_key()
            )))
        }
    };

    let mut items = Vec::with_capacity(nodes.len());
    for node in nodes {
        match parse_token_node(node, standard) {
            Some(item) => items.push(item),
            None => debug!(%standard, "skipping token entry without id or contract"),
        }
    }
    Ok(items)
}

/// Parse a single listing entry; `None` if it lacks a usable id or contract.
fn parse_token_node(node: &Value, standard: TokenStandard) -> Option<TokenItem> {
    let token_id = node.get("tokenId").and_then(decimal_field)?;
    let contract_address = node
        .get("address")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())?;

    let balance = match standard {
        TokenStandard::Erc721 => None,
        TokenStandard::Erc1155 => Some(
            node.get("balance")
                .and_then(decimal_field)
                .unwrap_or_else(|| "0".to_string()),
        ),
    };

    let metadata = node.get("metadata").map(parse_metadata).unwrap_or_default();

    Some(TokenItem {
        contract_address,
        token_id,
        balance,
        metadata,
    })
}

fn parse_metadata(meta: &Value) -> TokenMetadata {
    let text = |key: &str| {
        meta.get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
            .filter(|s| !s.is_empty())
    };

    // Indexers send attributes either pre-serialized or as raw JSON; the string
    // "null" shows up for tokens without any.
    let attributes = match meta.get("attributes") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() || s == "null" => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };

    TokenMetadata {
        name: text("name"),
        description: text("description"),
        image_uri: text("imageUri"),
        attributes,
    }
}
