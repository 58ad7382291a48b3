//! Signing capability held by a live session. Signing itself happens inside
//! the wallet provider; this handle only routes calls to it.
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};

use crate::provider::{ContractCall, ProviderError, Receipt, WalletProvider};

#[derive(Clone)]
pub struct SignerHandle {
    provider: Arc<dyn WalletProvider>,
    address: Address,
}

impl SignerHandle {
    pub(crate) fn new(provider: Arc<dyn WalletProvider>, address: Address) -> Self {
        Self { provider, address }
    }

    /// Same provider, different active account.
    pub(crate) fn with_address(&self, address: Address) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            address,
        }
    }

    /// The account this session was connected with.
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Ask the provider which address it will sign with right now.
    pub async fn current_address(&self) -> Result<Address, ProviderError> {
        self.provider.signer_address().await
    }

    /// Submit a contract call and wait for it to be mined.
    pub async fn submit_and_confirm(
        &self,
        from: Address,
        to: Address,
        data: Bytes,
    ) -> Result<Receipt, ProviderError> {
        let tx = self
            .provider
            .submit_contract_call(ContractCall { from, to, data })
            .await?;
        tracing::info!(%tx, "transaction submitted, awaiting confirmation");
        self.provider.await_confirmation(tx).await
    }
}

impl fmt::Debug for SignerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignerHandle")
            .field("kind", &self.provider.kind())
            .field("address", &self.address)
            .finish()
    }
}
