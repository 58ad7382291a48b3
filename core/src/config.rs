//! Viewer configuration: endpoints, timeouts and display settings.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://data-api.cloud.ormi.dev/somnia/v1";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs/";
pub const DEFAULT_PROVIDER_URL: &str = "https://dream-rpc.somnia.network";
pub const SOMNIA_TESTNET_CHAIN_ID: u64 = 50312;

const MIN_PAGE_SIZE: u32 = 1;
const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Base URL of the balance/NFT indexing API, without trailing slash.
    pub api_base: String,
    /// Gateway prefix substituted for `ipfs://`.
    pub ipfs_gateway: String,
    /// JSON-RPC endpoint of the remote wallet provider.
    pub provider_url: String,
    /// Reject the handshake when the provider reports a different chain.
    pub expected_chain_id: Option<u64>,
    pub native_symbol: String,
    pub page_size: u32,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub confirmation_timeout_secs: u64,
    pub allow_insecure: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            expected_chain_id: Some(SOMNIA_TESTNET_CHAIN_ID),
            native_symbol: "STT".to_string(),
            page_size: 100,
            request_timeout_secs: 15,
            poll_interval_ms: 2000,
            confirmation_timeout_secs: 120,
            allow_insecure: false,
        }
    }
}

impl ViewerConfig {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if given, else the default location if it exists, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Check URL schemes and bounds. Call after all overrides are applied.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.api_base, self.allow_insecure).context("api_base")?;
        validate_url(&self.ipfs_gateway, self.allow_insecure).context("ipfs_gateway")?;
        validate_url(&self.provider_url, self.allow_insecure).context("provider_url")?;
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than 0");
        }
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than 0");
        }
        Ok(())
    }

    /// Page size clamped to what the indexer accepts.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// API base with any trailing slash removed.
    pub fn api_base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}

/// Platform config location: `<config_dir>/somnia-viewer/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("somnia-viewer").join("config.json"))
}

/// Reject non-HTTPS URLs unless `allow_insecure` is set.
pub fn validate_url(url: &str, allow_insecure: bool) -> Result<()> {
    if url.starts_with("https://") {
        return Ok(());
    }
    if url.starts_with("http://") {
        if allow_insecure {
            return Ok(());
        }
        bail!(
            "Refusing to connect over plain HTTP: {url}\n\
             Use --insecure to allow unencrypted connections."
        );
    }
    bail!("Invalid URL scheme: {url}\nExpected an https:// URL.");
}
