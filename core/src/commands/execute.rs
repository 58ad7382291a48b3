use anyhow::{bail, Result};

use super::help::help_text;
use super::Command;
use crate::address::{is_address, to_lower_hex};
use crate::config::ViewerConfig;
use crate::display;
use crate::error::ViewerError;
use crate::indexer::TokenStandard;
use crate::session::ConnectionSession;
use crate::transfer::TransferRequest;

/// Rendering settings the commands need besides the session itself.
#[derive(Debug, Clone)]
pub struct ExecContext {
    pub native_symbol: String,
    pub ipfs_gateway: String,
    pub api_base: String,
}

impl ExecContext {
    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            native_symbol: config.native_symbol.clone(),
            ipfs_gateway: config.ipfs_gateway.clone(),
            api_base: config.api_base().to_string(),
        }
    }
}

impl Command {
    /// Execute a command and return the output string.
    pub async fn execute(
        &self,
        session: &ConnectionSession,
        ctx: &ExecContext,
        json_output: bool,
    ) -> Result<String> {
        let info = session.session().await;
        if self.requires_session() && info.is_none() {
            bail!("Not connected. Type 'connect' first.");
        }

        match self {
            Command::Connect => {
                let refresh = session.connect().await?;
                let address = to_lower_hex(refresh.address());
                refresh.wait().await;
                let shown = session.display();
                if json_output {
                    Ok(display::format_display_json(
                        &shown,
                        &ctx.native_symbol,
                        &ctx.ipfs_gateway,
                    ))
                } else {
                    Ok(format!(
                        "Connected: {address}\n\n{}",
                        display::format_display(&shown, &ctx.native_symbol, &ctx.ipfs_gateway)
                    ))
                }
            }

            Command::Disconnect => {
                session.disconnect().await;
                if json_output {
                    Ok(display::format_status_json(
                        session.state().await,
                        None,
                        &ctx.api_base,
                    ))
                } else {
                    Ok("Disconnected.".to_string())
                }
            }

            Command::Status => {
                let state = session.state().await;
                if json_output {
                    Ok(display::format_status_json(state, info.as_ref(), &ctx.api_base))
                } else {
                    Ok(display::format_status(state, info.as_ref(), &ctx.api_base))
                }
            }

            Command::Address => {
                let address = info.map(|s| to_lower_hex(&s.address)).unwrap_or_default();
                if json_output {
                    Ok(display::format_address_json(&address))
                } else {
                    Ok(address)
                }
            }

            Command::Balance => {
                let shown = session.settled().await;
                if json_output {
                    Ok(display::format_native_region_json(
                        &shown.native,
                        &ctx.native_symbol,
                    ))
                } else {
                    Ok(display::format_native_region(&shown.native, &ctx.native_symbol))
                }
            }

            Command::Nfts { standard } => {
                let shown = session.settled().await;
                let gateway = ctx.ipfs_gateway.as_str();
                match standard {
                    Some(TokenStandard::Erc721) if json_output => {
                        Ok(display::format_token_region_json(&shown.erc721, gateway))
                    }
                    Some(TokenStandard::Erc1155) if json_output => {
                        Ok(display::format_token_region_json(&shown.erc1155, gateway))
                    }
                    Some(TokenStandard::Erc721) => Ok(display::format_token_region(
                        TokenStandard::Erc721,
                        &shown.erc721,
                        gateway,
                    )),
                    Some(TokenStandard::Erc1155) => Ok(display::format_token_region(
                        TokenStandard::Erc1155,
                        &shown.erc1155,
                        gateway,
                    )),
                    None if json_output => Ok(serde_json::json!({
                        "erc721": serde_json::from_str::<serde_json::Value>(
                            &display::format_token_region_json(&shown.erc721, gateway)
                        )?,
                        "erc1155": serde_json::from_str::<serde_json::Value>(
                            &display::format_token_region_json(&shown.erc1155, gateway)
                        )?,
                    })
                    .to_string()),
                    None => Ok(format!(
                        "{}:\n{}\n\n{}:\n{}",
                        TokenStandard::Erc721,
                        display::format_token_region(TokenStandard::Erc721, &shown.erc721, gateway),
                        TokenStandard::Erc1155,
                        display::format_token_region(
                            TokenStandard::Erc1155,
                            &shown.erc1155,
                            gateway
                        ),
                    )),
                }
            }

            Command::Refresh => {
                let outcome = session.refresh().await?.wait().await;
                tracing::debug!(?outcome, "refresh finished");
                let shown = session.display();
                if json_output {
                    Ok(display::format_display_json(
                        &shown,
                        &ctx.native_symbol,
                        &ctx.ipfs_gateway,
                    ))
                } else {
                    Ok(display::format_display(&shown, &ctx.native_symbol, &ctx.ipfs_gateway))
                }
            }

            Command::Send {
                contract,
                token_id,
                recipient,
                amount,
            } => {
                if !is_address(recipient) {
                    let err = ViewerError::InvalidInput("Please enter a valid address".into());
                    return Err(err.into());
                }
                let shown = session.settled().await;
                let Some(max_balance) = shown.erc1155_balance(contract, token_id) else {
                    bail!(
                        "Token {token_id} of {contract} is not among the loaded ERC-1155 holdings. \
                         Run 'nfts 1155' to list them."
                    );
                };
                let request = TransferRequest {
                    contract: contract.clone(),
                    token_id: token_id.clone(),
                    recipient: recipient.clone(),
                    amount: amount.clone(),
                    max_balance: max_balance.to_string(),
                };

                let outcome = session.send_erc1155(&request).await?;
                if let Some(refresh) = outcome.refresh {
                    refresh.wait().await;
                }

                let block = outcome
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string());
                if json_output {
                    Ok(serde_json::json!({
                        "tx_hash": outcome.tx_hash,
                        "block_number": outcome.block_number,
                        "contract": contract,
                        "token_id": token_id,
                        "recipient": recipient,
                        "amount": amount,
                    })
                    .to_string())
                } else {
                    Ok(format!(
                        "Transfer successful!\n  Tx:    {}\n  Block: {block}",
                        outcome.tx_hash
                    ))
                }
            }

            Command::Help { command } => Ok(help_text(command.as_deref())),

            Command::Exit => Ok(String::new()),
        }
    }
}
