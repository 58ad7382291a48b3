use alloy_primitives::Address;

use super::state::{ConnectionState, DisconnectReason};
use crate::provider::ProviderEvent;

/// What a provider event asks the session to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ignore,
    Teardown(DisconnectReason),
    /// New primary account: replace the session address and reload.
    SwitchAccount(Address),
    /// Same primary account reported again: reload only.
    Refresh,
    /// Chain changed: tear down and ask the host to rebuild.
    Restart { chain_id: u64 },
}

/// Decide the reaction to a provider event. Events are only meaningful while
/// connected; anything else is ignored.
pub fn transition(
    state: ConnectionState,
    current: Option<&Address>,
    event: &ProviderEvent,
) -> Action {
    if state != ConnectionState::Connected {
        return Action::Ignore;
    }
    match event {
        ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
            None => Action::Teardown(DisconnectReason::AccountsCleared),
            Some(first) if Some(first) == current => Action::Refresh,
            Some(first) => Action::SwitchAccount(*first),
        },
        ProviderEvent::ChainChanged(chain_id) => Action::Restart { chain_id: *chain_id },
        ProviderEvent::Disconnected(reason) => {
            Action::Teardown(DisconnectReason::ProviderDisconnected(reason.clone()))
        }
    }
}
