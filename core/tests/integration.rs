/// Integration tests that hit the public Somnia testnet endpoints.
/// Run with: cargo test -- --ignored
use somnia_viewer_core::provider::WalletProvider;
use somnia_viewer_core::{
    Address, BalanceDataSource, IndexerClient, RpcWalletProvider, ViewerConfig,
};

/// Address with no history on the testnet.
fn fresh_address() -> Address {
    Address::repeat_byte(0x5e)
}

#[tokio::test]
#[ignore]
async fn testnet_native_balance_of_fresh_address() {
    let client = IndexerClient::new(&ViewerConfig::default()).expect("failed to build client");
    let balance = client
        .native_balance(&fresh_address())
        .await
        .expect("failed to query balance");
    assert_eq!(
        somnia_viewer_core::display::format_native_amount(&balance.balance),
        "0.000"
    );
}

#[tokio::test]
#[ignore]
async fn testnet_listings_of_fresh_address_are_empty() {
    let client = IndexerClient::new(&ViewerConfig::default()).expect("failed to build client");
    let erc721 = client
        .erc721_tokens(&fresh_address())
        .await
        .expect("failed to query ERC-721 listing");
    let erc1155 = client
        .erc1155_tokens(&fresh_address())
        .await
        .expect("failed to query ERC-1155 listing");
    assert!(erc721.is_empty());
    assert!(erc1155.is_empty());
}

#[tokio::test]
#[ignore]
async fn testnet_rpc_reports_somnia_chain() {
    let config = ViewerConfig::default();
    let provider = RpcWalletProvider::new(&config).expect("failed to build provider");
    let chain_id = provider.chain_id().await.expect("failed to query chain id");
    assert_eq!(Some(chain_id), config.expected_chain_id);
}
