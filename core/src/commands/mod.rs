//! Command definitions and parsing for the viewer REPL and one-shot mode.
mod execute;
mod help;
mod parse;

pub use execute::ExecContext;
pub use help::{help_text, COMMAND_NAMES};

use crate::indexer::TokenStandard;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Connect to the wallet provider
    Connect,
    /// End the session
    Disconnect,
    /// Show connection state
    Status,
    /// Show the connected address
    Address,
    /// Show the native balance
    Balance,
    /// Show held NFTs: nfts [721|1155]
    Nfts { standard: Option<TokenStandard> },
    /// Reload balance and listings
    Refresh,
    /// Send ERC-1155 tokens: send <contract> <token_id> <recipient> [amount]
    Send {
        contract: String,
        token_id: String,
        recipient: String,
        amount: String,
    },
    /// Print help
    Help { command: Option<String> },
    /// Exit the viewer
    Exit,
}

impl Command {
    /// Returns a confirmation prompt if this command should ask before executing.
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            Command::Send {
                contract,
                token_id,
                recipient,
                amount,
            } => Some(format!(
                "Send {amount} of token {token_id} ({contract}) to {recipient}?"
            )),
            _ => None,
        }
    }

    /// Whether the command needs a connected session to run.
    pub fn requires_session(&self) -> bool {
        matches!(
            self,
            Command::Address
                | Command::Balance
                | Command::Nfts { .. }
                | Command::Refresh
                | Command::Send { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_requires_confirmation() {
        let cmd = Command::Send {
            contract: "0xc0".into(),
            token_id: "7".into(),
            recipient: "0xabc".into(),
            amount: "2".into(),
        };
        let prompt = cmd.confirmation_prompt().unwrap();
        assert!(prompt.contains("Send 2 of token 7"));
        assert!(prompt.contains("0xabc"));
    }

    #[test]
    fn read_commands_do_not_confirm() {
        assert!(Command::Balance.confirmation_prompt().is_none());
        assert!(Command::Disconnect.confirmation_prompt().is_none());
    }

    #[test]
    fn session_requirements() {
        assert!(Command::Balance.requires_session());
        assert!(Command::Nfts { standard: None }.requires_session());
        assert!(!Command::Connect.requires_session());
        assert!(!Command::Status.requires_session());
        assert!(!Command::Help { command: None }.requires_session());
    }
}
