//! HTTP client for the balance/NFT indexing API.
mod nfts;
mod types;

pub use types::*;

use alloy_primitives::Address;
use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use crate::address::to_lower_hex;
use crate::config::{validate_url, ViewerConfig};
use crate::error::FetchFailure;

/// Read-only source of balances and holdings, keyed by address.
#[async_trait]
pub trait BalanceDataSource: Send + Sync {
    async fn native_balance(&self, address: &Address) -> Result<NativeBalance, FetchFailure>;

    async fn erc721_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure>;

    async fn erc1155_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure>;
}

pub struct IndexerClient {
    http: reqwest::Client,
    api_base: String,
    page_size: u32,
}

impl IndexerClient {
    pub fn new(config: &ViewerConfig) -> anyhow::Result<Self> {
        validate_url(config.api_base(), config.allow_insecure)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_base: config.api_base().to_string(),
            page_size: config.effective_page_size(),
        })
    }

    fn address_url(&self, address: &Address, tail: &str) -> String {
        format!("{}/address/{}/{tail}", self.api_base, to_lower_hex(address))
    }

    /// GET a JSON document. Non-2xx statuses become `FetchFailure::Status`.
    pub(super) async fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Value, FetchFailure> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchFailure::Decode(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else {
        FetchFailure::Transport(e.to_string())
    }
}

/// Read a decimal quantity that may be a JSON string or a non-negative integer.
/// Strings must be plain base-10 digits.
pub(super) fn decimal_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then(|| s.to_string())
        }
        Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}

/// Positional notation for a JSON number; `1e20` becomes `100000000000000000000`.
fn plain_decimal(n: &serde_json::Number) -> String {
    match (n.as_u64(), n.as_f64()) {
        (Some(v), _) => v.to_string(),
        (None, Some(f)) => f.to_string(),
        (None, None) => n.to_string(),
    }
}

/// Extract the native balance. A missing or null balance reads as zero.
pub(super) fn parse_native_balance(data: &Value) -> Result<NativeBalance, FetchFailure> {
    match data.get("balance") {
        None | Some(Value::Null) => Ok(NativeBalance {
            balance: "0".to_string(),
        }),
        Some(Value::Number(n)) => Ok(NativeBalance {
            balance: plain_decimal(n),
        }),
        Some(Value::String(s)) => Ok(NativeBalance {
            balance: s.trim().to_string(),
        }),
        Some(other) => Err(FetchFailure::Decode(format!(
            "unexpected balance value: {other}"
        ))),
    }
}

#[async_trait]
impl BalanceDataSource for IndexerClient {
    async fn native_balance(&self, address: &Address) -> Result<NativeBalance, FetchFailure> {
        let url = self.address_url(address, "balance/native");
        let data = self.get_json(&url, &[]).await?;
        parse_native_balance(&data)
    }

    async fn erc721_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure> {
        self.token_balances(address, TokenStandard::Erc721).await
    }

    async fn erc1155_tokens(&self, address: &Address) -> Result<Vec<TokenItem>, FetchFailure> {
        self.token_balances(address, TokenStandard::Erc1155).await
    }
}
