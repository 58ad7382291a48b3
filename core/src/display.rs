//! Output formatting for balances, token listings and session status.
//!
//! Native balances arrive as decimal strings and are shown with three
//! decimals, rounded half-up on the decimal digits themselves.
use serde_json::{json, Value};

use crate::error::FetchFailure;
use crate::indexer::{NativeBalance, TokenItem, TokenStandard};
use crate::session::{ConnectionState, DisplayState, RegionState, SessionInfo};

const DISPLAY_DECIMALS: usize = 3;

/// Round a decimal balance string to three places.
/// Examples: "1.5" -> "1.500", "0.0005" -> "0.001", "" -> "0.000".
/// Anything that is not a plain non-negative decimal shows as zero.
#[must_use]
pub fn format_native_amount(raw: &str) -> String {
    let zero = format!("0.{}", "0".repeat(DISPLAY_DECIMALS));
    let raw = raw.trim();
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return zero;
    }

    // Working digits: whole part followed by exactly DISPLAY_DECIMALS fraction digits.
    let mut digits: Vec<u8> = whole.bytes().map(|b| b - b'0').collect();
    digits.extend(
        frac.bytes()
            .map(|b| b - b'0')
            .chain(std::iter::repeat(0))
            .take(DISPLAY_DECIMALS),
    );

    if frac.as_bytes().get(DISPLAY_DECIMALS).is_some_and(|b| *b >= b'5') {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - DISPLAY_DECIMALS;
    let to_str = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    let int_part = to_str(&digits[..split]);
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    format!("{int_part}.{}", to_str(&digits[split..]))
}

/// Format a native balance with its symbol, e.g. "1.500 STT".
#[must_use]
pub fn format_balance(balance: &NativeBalance, symbol: &str) -> String {
    format!("{} {symbol}", format_native_amount(&balance.balance))
}

/// Rewrite `ipfs://` URIs onto an HTTP gateway. Missing URIs become "".
#[must_use]
pub fn resolve_image_uri(uri: Option<&str>, gateway: &str) -> String {
    let Some(uri) = uri else {
        return String::new();
    };
    match uri.strip_prefix("ipfs://") {
        Some(path) if gateway.ends_with('/') => format!("{gateway}{path}"),
        Some(path) => format!("{gateway}/{path}"),
        None => uri.to_string(),
    }
}

fn format_failure(failure: &FetchFailure) -> String {
    format!("Error: {failure}")
}

/// The native balance region as one line.
#[must_use]
pub fn format_native_region(region: &RegionState<NativeBalance>, symbol: &str) -> String {
    match region {
        RegionState::Empty => "-".to_string(),
        RegionState::Loading => "Loading balance...".to_string(),
        RegionState::Loaded(balance) => format_balance(balance, symbol),
        RegionState::Failed(failure) => format_failure(failure),
    }
}

fn format_token(item: &TokenItem, gateway: &str) -> String {
    let name = item.metadata.name.as_deref().unwrap_or("Unnamed NFT");
    let mut lines = vec![format!("  {name}")];
    lines.push(format!("    Token ID:    {}", item.token_id));
    if let Some(balance) = &item.balance {
        lines.push(format!("    Balance:     {balance}"));
    }
    lines.push(format!("    Contract:    {}", item.contract_address));
    if let Some(description) = &item.metadata.description {
        lines.push(format!("    Description: {description}"));
    }
    let image = resolve_image_uri(item.metadata.image_uri.as_deref(), gateway);
    if !image.is_empty() {
        lines.push(format!("    Image:       {image}"));
    }
    if let Some(attributes) = &item.metadata.attributes {
        lines.push(format!("    Attributes:  {attributes}"));
    }
    lines.join("\n")
}

/// A token listing region, with the empty-holding message when nothing is held.
#[must_use]
pub fn format_token_region(
    standard: TokenStandard,
    region: &RegionState<Vec<TokenItem>>,
    gateway: &str,
) -> String {
    match region {
        RegionState::Empty => "-".to_string(),
        RegionState::Loading => format!("Loading {standard} NFTs..."),
        RegionState::Failed(failure) => format_failure(failure),
        RegionState::Loaded(items) if items.is_empty() => format!(
            "No {standard} NFTs Found\nNo {standard} tokens were found in this wallet address."
        ),
        RegionState::Loaded(items) => items
            .iter()
            .map(|item| format_token(item, gateway))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

/// The full display: balance followed by both listings.
#[must_use]
pub fn format_display(display: &DisplayState, symbol: &str, gateway: &str) -> String {
    let Some(address) = &display.address else {
        return "Not connected.".to_string();
    };
    format!(
        "  Address: {address}\n  Balance: {}\n\n{}:\n{}\n\n{}:\n{}",
        format_native_region(&display.native, symbol),
        TokenStandard::Erc721,
        format_token_region(TokenStandard::Erc721, &display.erc721, gateway),
        TokenStandard::Erc1155,
        format_token_region(TokenStandard::Erc1155, &display.erc1155, gateway),
    )
}

/// Format connection status for display.
#[must_use]
pub fn format_status(
    state: ConnectionState,
    session: Option<&SessionInfo>,
    api_base: &str,
) -> String {
    let mut lines = vec![format!("  State:    {state}")];
    if let Some(session) = session {
        lines.push(format!(
            "  Account:  {}",
            crate::address::to_lower_hex(&session.address)
        ));
        lines.push(format!("  Provider: {}", session.provider_kind));
    }
    lines.push(format!("  Indexer:  {api_base}"));
    lines.join("\n")
}

fn region_json<T>(region: &RegionState<T>, loaded: impl FnOnce(&T) -> Value) -> Value {
    match region {
        RegionState::Empty => json!({ "state": "empty" }),
        RegionState::Loading => json!({ "state": "loading" }),
        RegionState::Loaded(value) => json!({ "state": "loaded", "data": loaded(value) }),
        RegionState::Failed(failure) => {
            let mut v = json!({ "state": "failed", "error": failure.to_string() });
            if let FetchFailure::Status(code) = failure {
                v["status"] = json!(code);
            }
            v
        }
    }
}

fn tokens_json(items: &[TokenItem], gateway: &str) -> Value {
    Value::Array(
        items
            .iter()
            .map(|item| {
                json!({
                    "contract_address": item.contract_address,
                    "token_id": item.token_id,
                    "balance": item.balance,
                    "name": item.metadata.name,
                    "description": item.metadata.description,
                    "image_url": resolve_image_uri(item.metadata.image_uri.as_deref(), gateway),
                    "attributes": item.metadata.attributes,
                })
            })
            .collect(),
    )
}

/// Format the native balance region as JSON.
#[must_use]
pub fn format_native_region_json(region: &RegionState<NativeBalance>, symbol: &str) -> String {
    region_json(region, |balance| {
        json!({
            "balance": balance.balance,
            "formatted": format_native_amount(&balance.balance),
            "symbol": symbol,
        })
    })
    .to_string()
}

/// Format a token listing region as JSON.
#[must_use]
pub fn format_token_region_json(region: &RegionState<Vec<TokenItem>>, gateway: &str) -> String {
    region_json(region, |items| tokens_json(items, gateway)).to_string()
}

/// Format the full display as JSON.
#[must_use]
pub fn format_display_json(display: &DisplayState, symbol: &str, gateway: &str) -> String {
    json!({
        "address": display.address,
        "native": region_json(&display.native, |b| json!({
            "balance": b.balance,
            "formatted": format_native_amount(&b.balance),
            "symbol": symbol,
        })),
        "erc721": region_json(&display.erc721, |items| tokens_json(items, gateway)),
        "erc1155": region_json(&display.erc1155, |items| tokens_json(items, gateway)),
    })
    .to_string()
}

/// Format connection status as JSON.
#[must_use]
pub fn format_status_json(
    state: ConnectionState,
    session: Option<&SessionInfo>,
    api_base: &str,
) -> String {
    json!({
        "state": state,
        "address": session.map(|s| crate::address::to_lower_hex(&s.address)),
        "provider": session.map(|s| s.provider_kind),
        "indexer": api_base,
    })
    .to_string()
}

/// Format address as JSON.
#[must_use]
pub fn format_address_json(address: &str) -> String {
    json!({ "address": address }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::TokenMetadata;

    const GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs/";

    #[test]
    fn native_amount_rounding() {
        assert_eq!(format_native_amount("1.5"), "1.500");
        assert_eq!(format_native_amount("0.0005"), "0.001");
        assert_eq!(format_native_amount("2.9999"), "3.000");
        assert_eq!(format_native_amount("0.0004"), "0.000");
        assert_eq!(format_native_amount("999.9995"), "1000.000");
        assert_eq!(format_native_amount("42"), "42.000");
        assert_eq!(format_native_amount("007.25"), "7.250");
        assert_eq!(format_native_amount(".5"), "0.500");
    }

    #[test]
    fn native_amount_garbage_is_zero() {
        for raw in ["", "  ", ".", "abc", "-1", "1.2.3", "1e18"] {
            assert_eq!(format_native_amount(raw), "0.000", "input {raw:?}");
        }
    }

    #[test]
    fn balance_with_symbol() {
        let balance = NativeBalance {
            balance: "1.5".into(),
        };
        assert_eq!(format_balance(&balance, "STT"), "1.500 STT");
    }

    #[test]
    fn ipfs_uris_rewritten() {
        assert_eq!(
            resolve_image_uri(Some("ipfs://bafy123/1.png"), GATEWAY),
            "https://cloudflare-ipfs.com/ipfs/bafy123/1.png"
        );
        assert_eq!(
            resolve_image_uri(Some("ipfs://bafy123"), "https://gw.example/ipfs"),
            "https://gw.example/ipfs/bafy123"
        );
    }

    #[test]
    fn other_uris_unchanged() {
        assert_eq!(
            resolve_image_uri(Some("https://img.example/a.png"), GATEWAY),
            "https://img.example/a.png"
        );
        assert_eq!(resolve_image_uri(None, GATEWAY), "");
    }

    #[test]
    fn empty_listing_message() {
        let text =
            format_token_region(TokenStandard::Erc721, &RegionState::Loaded(vec![]), GATEWAY);
        assert!(text.starts_with("No ERC-721 NFTs Found"));
    }

    #[test]
    fn unnamed_token_and_resolved_image() {
        let item = TokenItem {
            contract_address: "0xabc".into(),
            token_id: "9".into(),
            balance: Some("3".into()),
            metadata: TokenMetadata {
                image_uri: Some("ipfs://cid/9.png".into()),
                ..Default::default()
            },
        };
        let text = format_token_region(
            TokenStandard::Erc1155,
            &RegionState::Loaded(vec![item]),
            GATEWAY,
        );
        assert!(text.contains("Unnamed NFT"));
        assert!(text.contains("Balance:     3"));
        assert!(text.contains("https://cloudflare-ipfs.com/ipfs/cid/9.png"));
    }

    #[test]
    fn failed_region_shows_status() {
        let region: RegionState<NativeBalance> = RegionState::Failed(FetchFailure::Status(500));
        assert_eq!(format_native_region(&region, "STT"), "Error: HTTP error! status: 500");
        let parsed: Value =
            serde_json::from_str(&format_native_region_json(&region, "STT")).unwrap();
        assert_eq!(parsed["state"], "failed");
        assert_eq!(parsed["status"], 500);
    }

    #[test]
    fn display_json_shape() {
        let display = DisplayState {
            address: Some("0xabc".into()),
            native: RegionState::Loaded(NativeBalance {
                balance: "1.5".into(),
            }),
            erc721: RegionState::Loaded(vec![]),
            erc1155: RegionState::Loading,
        };
        let parsed: Value =
            serde_json::from_str(&format_display_json(&display, "STT", GATEWAY)).unwrap();
        assert_eq!(parsed["native"]["data"]["formatted"], "1.500");
        assert_eq!(parsed["erc721"]["data"], json!([]));
        assert_eq!(parsed["erc1155"]["state"], "loading");
    }

    #[test]
    fn disconnected_display() {
        assert_eq!(format_display(&DisplayState::default(), "STT", GATEWAY), "Not connected.");
    }
}
