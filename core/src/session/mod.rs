//! Wallet connection lifecycle and the per-account display refresh.
//!
//! A `ConnectionSession` owns the provider subscription and the three display
//! regions. Every refresh takes a fresh generation number; a query result is
//! applied only if the session is still connected to the same address under
//! the same generation, so late answers for a previous account never land.
mod state;
mod transition;

pub use state::{
    ConnectionState, DisconnectReason, DisplayState, RegionState, SessionInfo, SessionNotice,
};
pub use transition::{transition, Action};

use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::address::to_lower_hex;
use crate::config::ViewerConfig;
use crate::error::{FetchFailure, Result, ViewerError};
use crate::indexer::{BalanceDataSource, NativeBalance, TokenItem, TokenStandard};
use crate::provider::{ProviderError, ProviderEvent, WalletProvider};
use crate::signer::SignerHandle;
use crate::transfer::{self, TransferOutcome, TransferRequest};
use state::Session;

const NOTICE_CAPACITY: usize = 32;

struct SessionCore {
    connection: ConnectionState,
    session: Option<Session>,
    generation: u64,
    pump: Option<JoinHandle<()>>,
}

struct Inner {
    provider: Option<Arc<dyn WalletProvider>>,
    source: Arc<dyn BalanceDataSource>,
    request_timeout: Duration,
    expected_chain_id: Option<u64>,
    core: Mutex<SessionCore>,
    /// Serializes `connect` calls.
    connecting: Mutex<()>,
    display: watch::Sender<DisplayState>,
    notices: broadcast::Sender<SessionNotice>,
}

/// Cheaply cloneable handle to one viewer session.
#[derive(Clone)]
pub struct ConnectionSession {
    inner: Arc<Inner>,
}

/// How many region results a refresh applied versus discarded as stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub applied: usize,
    pub discarded: usize,
}

/// A running refresh. Dropping it does not cancel the refresh.
#[derive(Debug)]
pub struct RefreshHandle {
    address: Address,
    task: JoinHandle<RefreshOutcome>,
}

impl RefreshHandle {
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Wait until all three queries have resolved or timed out.
    pub async fn wait(self) -> RefreshOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "refresh task did not complete");
                RefreshOutcome::default()
            }
        }
    }
}

enum RegionUpdate {
    Native(std::result::Result<NativeBalance, FetchFailure>),
    Tokens(TokenStandard, std::result::Result<Vec<TokenItem>, FetchFailure>),
}

fn handshake_error(e: ProviderError) -> ViewerError {
    ViewerError::HandshakeFailed(e.to_string())
}

fn transfer_error(e: ProviderError) -> ViewerError {
    ViewerError::TransferFailed(e.to_string())
}

async fn bounded<T>(
    limit: Duration,
    query: impl Future<Output = std::result::Result<T, FetchFailure>>,
) -> std::result::Result<T, FetchFailure> {
    match tokio::time::timeout(limit, query).await {
        Ok(result) => result,
        Err(_) => Err(FetchFailure::Timeout),
    }
}

/// Armed while `connect` holds the state at `Connecting`. Dropping it armed,
/// as happens when the `connect` future is cancelled, tears the attempt down.
struct PendingConnect {
    inner: Weak<Inner>,
    generation: u64,
    armed: bool,
}

impl PendingConnect {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingConnect {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let session = ConnectionSession { inner };
        let generation = self.generation;
        let handled = match session.inner.core.try_lock() {
            Ok(mut core) => {
                let stale_pump = session.abandon_locked(&mut core, generation);
                drop(core);
                if let Some(pump) = stale_pump {
                    pump.abort();
                }
                true
            }
            Err(_) => false,
        };
        if !handled {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move { session.abandon(generation).await });
            }
        }
    }
}

async fn pump_events(inner: Weak<Inner>, mut events: mpsc::Receiver<ProviderEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        ConnectionSession { inner }.handle_event(event).await;
    }
    debug!("provider event stream closed");
}

impl ConnectionSession {
    /// `provider` is `None` when the host environment offers no wallet.
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        source: Arc<dyn BalanceDataSource>,
        config: &ViewerConfig,
    ) -> Self {
        let (display, _) = watch::channel(DisplayState::default());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                provider,
                source,
                request_timeout: config.request_timeout(),
                expected_chain_id: config.expected_chain_id,
                core: Mutex::new(SessionCore {
                    connection: ConnectionState::Disconnected,
                    session: None,
                    generation: 0,
                    pump: None,
                }),
                connecting: Mutex::new(()),
                display,
                notices,
            }),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.inner.provider.is_some()
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.core.lock().await.connection
    }

    pub async fn session(&self) -> Option<SessionInfo> {
        self.inner.core.lock().await.session.as_ref().map(Session::info)
    }

    /// Snapshot of what is currently rendered.
    pub fn display(&self) -> DisplayState {
        self.inner.display.borrow().clone()
    }

    pub fn watch_display(&self) -> watch::Receiver<DisplayState> {
        self.inner.display.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.inner.notices.subscribe()
    }

    /// Wait until no region is loading and return that display.
    pub async fn settled(&self) -> DisplayState {
        let mut rx = self.inner.display.subscribe();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            if !snapshot.is_loading() {
                return snapshot;
            }
            if rx.changed().await.is_err() {
                return snapshot;
            }
        }
    }

    fn notify(&self, notice: SessionNotice) {
        // No subscribers is fine.
        let _ = self.inner.notices.send(notice);
    }

    /// Request account access, subscribe to provider events and start the
    /// first refresh. An existing session is torn down first.
    pub async fn connect(&self) -> Result<RefreshHandle> {
        let provider = self.inner.provider.clone().ok_or_else(|| {
            ViewerError::ProviderUnavailable("no wallet provider is configured".into())
        })?;
        let _serial = self.inner.connecting.lock().await;

        let pending = {
            let mut core = self.inner.core.lock().await;
            let stale_pump = self.teardown_locked(&mut core, DisconnectReason::UserRequested);
            core.connection = ConnectionState::Connecting;
            let pending = PendingConnect {
                inner: Arc::downgrade(&self.inner),
                generation: core.generation,
                armed: true,
            };
            drop(core);
            if let Some(pump) = stale_pump {
                pump.abort();
            }
            pending
        };
        debug!(kind = %provider.kind(), "requesting wallet accounts");

        let (address, events) = match self.handshake(provider.as_ref()).await {
            Ok(ok) => ok,
            Err(e) => {
                warn!(error = %e, "wallet handshake failed");
                let mut core = self.inner.core.lock().await;
                let stale_pump = self.teardown_locked(
                    &mut core,
                    DisconnectReason::HandshakeFailed(e.to_string()),
                );
                drop(core);
                if let Some(pump) = stale_pump {
                    pump.abort();
                }
                pending.disarm();
                return Err(e);
            }
        };

        let mut core = self.inner.core.lock().await;
        pending.disarm();
        if core.connection != ConnectionState::Connecting {
            // Torn down while the handshake was in flight.
            drop(core);
            provider.unsubscribe();
            return Err(ViewerError::HandshakeFailed("connection cancelled".into()));
        }
        core.connection = ConnectionState::Connected;
        core.session = Some(Session {
            address,
            provider_kind: provider.kind(),
            signer: SignerHandle::new(Arc::clone(&provider), address),
        });
        core.pump = Some(tokio::spawn(pump_events(Arc::downgrade(&self.inner), events)));
        info!(%address, kind = %provider.kind(), "wallet connected");
        self.notify(SessionNotice::Connected(address));

        self.start_refresh_locked(&mut core)
            .ok_or_else(|| ViewerError::Other(anyhow::anyhow!("session vanished during connect")))
    }

    async fn handshake(
        &self,
        provider: &dyn WalletProvider,
    ) -> Result<(Address, mpsc::Receiver<ProviderEvent>)> {
        let accounts = provider.request_accounts().await.map_err(handshake_error)?;
        let address = *accounts
            .first()
            .ok_or_else(|| ViewerError::HandshakeFailed("No accounts found".into()))?;

        if let Some(expected) = self.inner.expected_chain_id {
            let chain_id = provider.chain_id().await.map_err(handshake_error)?;
            if chain_id != expected {
                return Err(ViewerError::HandshakeFailed(format!(
                    "wallet is on chain {chain_id}, expected {expected}"
                )));
            }
        }

        let events = provider.subscribe().await.map_err(handshake_error)?;
        Ok((address, events))
    }

    /// End the session by user request.
    pub async fn disconnect(&self) {
        info!("disconnect requested");
        let connected = self.inner.core.lock().await.session.is_some();
        if let (true, Some(provider)) = (connected, &self.inner.provider) {
            // Local teardown happens whatever the wallet answers.
            if let Err(e) = provider.release_accounts().await {
                warn!(error = %e, "wallet permission reset failed");
            }
        }
        self.teardown().await;
    }

    /// Drop the session, unsubscribe from the provider and clear the
    /// display. Calling it again changes nothing.
    pub async fn teardown(&self) {
        let mut core = self.inner.core.lock().await;
        let stale_pump = self.teardown_locked(&mut core, DisconnectReason::UserRequested);
        drop(core);
        if let Some(pump) = stale_pump {
            pump.abort();
        }
    }

    /// Synchronous once the lock is held, so it is safe to run from inside the
    /// pump task whose handle it returns. The caller aborts that handle after
    /// releasing the lock.
    fn teardown_locked(
        &self,
        core: &mut SessionCore,
        reason: DisconnectReason,
    ) -> Option<JoinHandle<()>> {
        let was = core.connection;
        if let Some(provider) = &self.inner.provider {
            provider.unsubscribe();
        }
        core.session = None;
        core.connection = ConnectionState::Disconnected;
        core.generation += 1;
        self.inner.display.send_if_modified(|display| {
            if display.is_cleared() {
                false
            } else {
                *display = DisplayState::default();
                true
            }
        });
        if was != ConnectionState::Disconnected {
            info!(%reason, "session torn down");
            self.notify(SessionNotice::Disconnected(reason));
        }
        core.pump.take()
    }

    /// Tear down a connect attempt abandoned under `generation`. A newer
    /// attempt or a completed one is left alone.
    fn abandon_locked(&self, core: &mut SessionCore, generation: u64) -> Option<JoinHandle<()>> {
        if core.connection != ConnectionState::Connecting || core.generation != generation {
            return None;
        }
        warn!(generation, "connect attempt dropped before completing");
        self.teardown_locked(
            core,
            DisconnectReason::HandshakeFailed("connection cancelled".into()),
        )
    }

    async fn abandon(&self, generation: u64) {
        let mut core = self.inner.core.lock().await;
        let stale_pump = self.abandon_locked(&mut core, generation);
        drop(core);
        if let Some(pump) = stale_pump {
            pump.abort();
        }
    }

    /// Reload all three regions for the connected account.
    pub async fn refresh(&self) -> Result<RefreshHandle> {
        let mut core = self.inner.core.lock().await;
        self.start_refresh_locked(&mut core)
            .ok_or_else(|| ViewerError::InvalidInput("not connected".into()))
    }

    /// Reload for `address`, which must be the connected account.
    pub async fn refresh_address(&self, address: &Address) -> Result<RefreshHandle> {
        let mut core = self.inner.core.lock().await;
        match &core.session {
            None => return Err(ViewerError::InvalidInput("not connected".into())),
            Some(session) if session.address != *address => {
                return Err(ViewerError::InvalidInput(format!(
                    "{} is not the connected account",
                    to_lower_hex(address)
                )))
            }
            Some(_) => {}
        }
        self.start_refresh_locked(&mut core)
            .ok_or_else(|| ViewerError::InvalidInput("not connected".into()))
    }

    fn start_refresh_locked(&self, core: &mut SessionCore) -> Option<RefreshHandle> {
        let address = core.session.as_ref()?.address;
        core.generation += 1;
        let generation = core.generation;
        debug!(%address, generation, "starting refresh");

        self.inner.display.send_modify(|display| {
            display.address = Some(to_lower_hex(&address));
            display.native = RegionState::Loading;
            display.erc721 = RegionState::Loading;
            display.erc1155 = RegionState::Loading;
        });

        let this = self.clone();
        let task = tokio::spawn(async move { this.run_refresh(address, generation).await });
        Some(RefreshHandle { address, task })
    }

    async fn run_refresh(&self, address: Address, generation: u64) -> RefreshOutcome {
        let source = Arc::clone(&self.inner.source);
        let limit = self.inner.request_timeout;

        let native = async {
            let result = bounded(limit, source.native_balance(&address)).await;
            self.apply(address, generation, RegionUpdate::Native(result)).await
        };
        let erc721 = async {
            let result = bounded(limit, source.erc721_tokens(&address)).await;
            self.apply(address, generation, RegionUpdate::Tokens(TokenStandard::Erc721, result))
                .await
        };
        let erc1155 = async {
            let result = bounded(limit, source.erc1155_tokens(&address)).await;
            self.apply(address, generation, RegionUpdate::Tokens(TokenStandard::Erc1155, result))
                .await
        };

        let (a, b, c) = futures::join!(native, erc721, erc1155);
        let applied = [a, b, c].iter().filter(|applied| **applied).count();
        RefreshOutcome {
            applied,
            discarded: 3 - applied,
        }
    }

    /// Apply one region result if it still belongs to the live session.
    async fn apply(&self, address: Address, generation: u64, update: RegionUpdate) -> bool {
        let core = self.inner.core.lock().await;
        let current = core.connection == ConnectionState::Connected
            && core.generation == generation
            && core.session.as_ref().is_some_and(|s| s.address == address);
        if !current {
            debug!(%address, generation, latest = core.generation, "discarding stale result");
            return false;
        }

        match update {
            RegionUpdate::Native(result) => {
                if let Err(e) = &result {
                    warn!(%address, error = %e, "native balance fetch failed");
                }
                self.inner.display.send_modify(|display| {
                    display.native = match result {
                        Ok(balance) => RegionState::Loaded(balance),
                        Err(e) => RegionState::Failed(e),
                    };
                });
            }
            RegionUpdate::Tokens(standard, result) => {
                if let Err(e) = &result {
                    warn!(%address, %standard, error = %e, "token listing fetch failed");
                }
                let region = match result {
                    Ok(items) => RegionState::Loaded(items),
                    Err(e) => RegionState::Failed(e),
                };
                self.inner.display.send_modify(|display| match standard {
                    TokenStandard::Erc721 => display.erc721 = region,
                    TokenStandard::Erc1155 => display.erc1155 = region,
                });
            }
        }
        true
    }

    /// React to one provider event. Returns the action taken.
    pub async fn handle_event(&self, event: ProviderEvent) -> Action {
        let mut core = self.inner.core.lock().await;
        let current = core.session.as_ref().map(|s| s.address);
        let action = transition(core.connection, current.as_ref(), &event);

        let mut stale_pump = None;
        match &action {
            Action::Ignore => debug!(?event, state = %core.connection, "ignoring provider event"),
            Action::Teardown(reason) => {
                stale_pump = self.teardown_locked(&mut core, reason.clone());
            }
            Action::Restart { chain_id } => {
                stale_pump =
                    self.teardown_locked(&mut core, DisconnectReason::ChainChanged(*chain_id));
                self.notify(SessionNotice::ReloadRequired {
                    chain_id: *chain_id,
                });
            }
            Action::SwitchAccount(address) => {
                if let Some(session) = core.session.as_mut() {
                    session.address = *address;
                    session.signer = session.signer.with_address(*address);
                }
                info!(%address, "active account switched");
                self.notify(SessionNotice::AccountSwitched(*address));
                self.start_refresh_locked(&mut core);
            }
            Action::Refresh => {
                self.start_refresh_locked(&mut core);
            }
        }
        drop(core);

        if let Some(pump) = stale_pump {
            pump.abort();
        }
        action
    }

    /// Validate, encode, submit and confirm an ERC-1155 `safeTransferFrom`,
    /// then refresh the display. The display is not changed optimistically.
    pub async fn send_erc1155(&self, request: &TransferRequest) -> Result<TransferOutcome> {
        let transfer = request.validate()?;

        let signer = {
            let core = self.inner.core.lock().await;
            let signer = core.session.as_ref().map(|s| s.signer.clone());
            signer
        }
        .ok_or_else(|| ViewerError::TransferFailed("not connected".into()))?;

        let from = signer.current_address().await.map_err(transfer_error)?;
        if from != *signer.address() {
            debug!(
                session = %signer.address(),
                signer = %from,
                "wallet signs with another account"
            );
        }
        let data = transfer::encode_safe_transfer(from, &transfer);
        info!(
            contract = %transfer.contract,
            token_id = %transfer.token_id,
            recipient = %transfer.recipient,
            amount = %transfer.amount,
            "sending ERC-1155 transfer"
        );

        let receipt = signer
            .submit_and_confirm(from, transfer.contract, data)
            .await
            .map_err(|e| {
                warn!(error = %e, "transfer failed");
                transfer_error(e)
            })?;
        info!(tx = %receipt.transaction_hash, block = ?receipt.block_number, "transfer confirmed");
        self.notify(SessionNotice::TransferConfirmed(receipt.transaction_hash));

        let refresh = {
            let mut core = self.inner.core.lock().await;
            let refresh = self.start_refresh_locked(&mut core);
            refresh
        };
        Ok(TransferOutcome {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            refresh,
        })
    }
}
