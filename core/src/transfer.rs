//! ERC-1155 transfer: input validation and `safeTransferFrom` encoding.

use alloy_primitives::{Address, Bytes, TxHash, U256};
use alloy_sol_types::{sol, SolCall};

use crate::address::parse_address;
use crate::error::{Result, ViewerError};
use crate::session::RefreshHandle;

sol! {
    interface IERC1155 {
        function safeTransferFrom(address from, address to, uint256 id, uint256 amount, bytes data) external;
    }
}

/// Raw user input for an ERC-1155 send. `max_balance` is the balance shown
/// when the item was rendered; it is not re-queried before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub contract: String,
    pub token_id: String,
    pub recipient: String,
    pub amount: String,
    pub max_balance: String,
}

/// A request that passed validation and can be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTransfer {
    pub contract: Address,
    pub token_id: U256,
    pub recipient: Address,
    pub amount: U256,
}

#[derive(Debug)]
pub struct TransferOutcome {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Refresh started after confirmation; `None` if the session ended meanwhile.
    pub refresh: Option<RefreshHandle>,
}

fn parse_decimal(input: &str) -> Option<U256> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    U256::from_str_radix(input, 10).ok()
}

impl TransferRequest {
    /// Validate recipient, then amount, then the token coordinates.
    /// Nothing here touches the network.
    pub fn validate(&self) -> Result<ValidatedTransfer> {
        let recipient = parse_address(&self.recipient)
            .map_err(|_| ViewerError::InvalidInput("Please enter a valid address".into()))?;

        let amount_error = || {
            ViewerError::InvalidInput(format!(
                "Enter a valid amount between 1 and {}",
                self.max_balance.trim()
            ))
        };
        let max = parse_decimal(&self.max_balance).ok_or_else(amount_error)?;
        let amount = parse_decimal(&self.amount).ok_or_else(amount_error)?;
        if amount.is_zero() || amount > max {
            return Err(amount_error());
        }

        let contract = parse_address(&self.contract).map_err(|e| {
            ViewerError::InvalidInput(format!("Invalid contract address: {e}"))
        })?;
        let token_id = parse_decimal(&self.token_id).ok_or_else(|| {
            ViewerError::InvalidInput(format!("Invalid token id '{}'", self.token_id))
        })?;

        Ok(ValidatedTransfer {
            contract,
            token_id,
            recipient,
            amount,
        })
    }
}

/// Calldata for `safeTransferFrom(from, to, id, amount, 0x)`.
#[must_use]
pub fn encode_safe_transfer(from: Address, transfer: &ValidatedTransfer) -> Bytes {
    IERC1155::safeTransferFromCall {
        from,
        to: transfer.recipient,
        id: transfer.token_id,
        amount: transfer.amount,
        data: Bytes::new(),
    }
    .abi_encode()
    .into()
}
