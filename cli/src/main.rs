mod repl;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use somnia_viewer_core::commands::{Command, ExecContext};
use somnia_viewer_core::{
    BalanceDataSource, ConnectionSession, IndexerClient, RpcWalletProvider, ViewerConfig,
    WalletProvider,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "somnia-viewer",
    about = "Somnia wallet viewer: balances, NFTs and ERC-1155 transfers",
    version
)]
pub(crate) struct Cli {
    /// Config file (default: <config_dir>/somnia-viewer/config.json if present)
    #[arg(long, env = "SOMNIA_VIEWER_CONFIG")]
    config: Option<PathBuf>,

    /// Indexing API base URL
    #[arg(long, env = "SOMNIA_API_BASE")]
    api_base: Option<String>,

    /// Gateway substituted for ipfs:// image URIs
    #[arg(long, env = "SOMNIA_IPFS_GATEWAY")]
    gateway: Option<String>,

    /// JSON-RPC URL of the wallet provider
    #[arg(long, env = "SOMNIA_PROVIDER_URL")]
    provider_url: Option<String>,

    /// Chain id the wallet must report on connect
    #[arg(long, env = "SOMNIA_CHAIN_ID")]
    chain_id: Option<u64>,

    /// Accept whatever chain the wallet is on
    #[arg(long, conflicts_with = "chain_id")]
    any_chain: bool,

    /// Start without a wallet provider (read-only status and help)
    #[arg(long)]
    no_provider: bool,

    /// Items per NFT listing request (1-1000)
    #[arg(long)]
    page_size: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Run a single command and exit (connects first when needed)
    #[arg(long)]
    cmd: Option<String>,

    /// Output in JSON format (useful with --cmd)
    #[arg(long)]
    json: bool,

    /// Allow non-HTTPS endpoint URLs
    #[arg(long)]
    insecure: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags and environment.
    fn resolve_config(&self) -> Result<ViewerConfig> {
        let mut config = ViewerConfig::load(self.config.as_deref())?;
        if let Some(url) = &self.api_base {
            config.api_base = url.clone();
        }
        if let Some(url) = &self.gateway {
            config.ipfs_gateway = url.clone();
        }
        if let Some(url) = &self.provider_url {
            config.provider_url = url.clone();
        }
        if let Some(id) = self.chain_id {
            config.expected_chain_id = Some(id);
        }
        if self.any_chain {
            config.expected_chain_id = None;
        }
        if let Some(size) = self.page_size {
            config.page_size = size;
        }
        if let Some(secs) = self.timeout {
            config.request_timeout_secs = secs;
        }
        if self.insecure {
            config.allow_insecure = true;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    fn build_session(&self, config: &ViewerConfig) -> Result<ConnectionSession> {
        let source: Arc<dyn BalanceDataSource> = Arc::new(IndexerClient::new(config)?);
        let provider: Option<Arc<dyn WalletProvider>> = if self.no_provider {
            None
        } else {
            Some(Arc::new(RpcWalletProvider::new(config)?))
        };
        Ok(ConnectionSession::new(provider, source, config))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.resolve_config()?;
    let session = cli.build_session(&config)?;
    let ctx = ExecContext::from_config(&config);

    let result = if let Some(cmd_str) = &cli.cmd {
        // One-shot mode
        run_oneshot(&session, &ctx, cli.json, cmd_str).await
    } else {
        // REPL mode
        repl::run_repl(&session, &ctx, &config).await
    };
    session.teardown().await;
    result
}

async fn run_oneshot(
    session: &ConnectionSession,
    ctx: &ExecContext,
    json: bool,
    cmd_str: &str,
) -> Result<()> {
    let command = Command::parse(cmd_str)?;
    if command == Command::Exit {
        return Ok(());
    }

    if command.requires_session() {
        session
            .connect()
            .await
            .context("Failed to connect to the wallet provider")?
            .wait()
            .await;
    }

    let output = command.execute(session, ctx, json).await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
